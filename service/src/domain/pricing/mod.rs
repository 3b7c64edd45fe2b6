//! Pricing engine turning a flat project budget into an auditable
//! [`Breakdown`] of labour and infrastructure costs.

pub mod preset;

use std::fmt;

use common::{define_kind, Money, Percent};
use rust_decimal::Decimal;

use super::{
    line_item::{self, LineItem},
    InvalidArgument,
};

pub use self::preset::Preset;

/// Greatest total a [`Breakdown`] can be calculated for.
const MAX_TOTAL: i64 = 1_000_000_000_000_000;

/// Default description of the labour [`LineItem`].
pub const LABOUR_DESCRIPTION: &str = "Website Development";

define_kind! {
    #[doc = "Pricing tier, determining the labour share of a total."]
    #[serialize_all = "snake_case"]
    enum Tier {
        #[doc = "Small project, like a single page site."]
        Small = 1,

        #[doc = "Medium project, like a business site."]
        Medium = 2,

        #[doc = "Large project, like an online store."]
        Large = 3,

        #[doc = "Custom project, like a mobile application."]
        Custom = 4,
    }
}

impl Tier {
    /// Returns the labour share of a total priced in this [`Tier`].
    #[must_use]
    pub const fn labour_share(self) -> Percent {
        match self {
            Self::Small => Percent::whole(30),
            Self::Medium => Percent::whole(35),
            Self::Large => Percent::whole(45),
            Self::Custom => Percent::whole(50),
        }
    }

    /// Suggests the [`Tier`] for the provided project `total`.
    #[must_use]
    pub fn suggest(total: Decimal) -> Self {
        if total < Decimal::from(3_500) {
            Self::Small
        } else if total < Decimal::from(7_000) {
            Self::Medium
        } else if total < Decimal::from(15_000) {
            Self::Large
        } else {
            Self::Custom
        }
    }
}

impl Default for Tier {
    fn default() -> Self {
        Self::Small
    }
}

define_kind! {
    #[doc = "Infrastructure component priced out of the infrastructure share."]
    #[serialize_all = "snake_case"]
    enum Component {
        #[doc = "Web hosting."]
        Hosting = 1,

        #[doc = "SSL certificates and security monitoring."]
        Ssl = 2,

        #[doc = "Content delivery network."]
        Cdn = 3,

        #[doc = "Automated backups."]
        Backups = 4,

        #[doc = "Uptime monitoring and maintenance."]
        Monitoring = 5,
    }
}

impl Component {
    /// Returns the share of the infrastructure total this [`Component`]
    /// takes.
    #[must_use]
    pub const fn share(self) -> Percent {
        match self {
            Self::Hosting => Percent::whole(48),
            Self::Ssl => Percent::whole(22),
            Self::Cdn => Percent::whole(14),
            Self::Backups => Percent::whole(6),
            Self::Monitoring => Percent::whole(10),
        }
    }

    /// Returns the short human-readable label of this [`Component`].
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hosting => "Web Hosting",
            Self::Ssl => "SSL & Security",
            Self::Cdn => "CDN",
            Self::Backups => "Automated Backups",
            Self::Monitoring => "Monitoring & Maintenance",
        }
    }

    /// Returns what this [`Component`] covers.
    #[must_use]
    pub const fn summary(self) -> &'static str {
        match self {
            Self::Hosting => "Cloud hosting, 99.9% uptime",
            Self::Ssl => "HTTPS encryption, security monitoring",
            Self::Cdn => "Content delivery network for fast loading",
            Self::Backups => "Daily backups and recovery",
            Self::Monitoring => "Uptime monitoring, technical maintenance",
        }
    }

    /// Returns the [`line_item::Description`] of a yearly subscription for
    /// this [`Component`].
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn line_item_description(self) -> line_item::Description {
        line_item::Description::new(format!(
            "{} (1 year) - {}",
            self.label(),
            self.summary(),
        ))
        .expect("labels and summaries are trimmed and short")
    }
}

/// Split of an [`Infrastructure`] total between its [`Component`]s.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Infrastructure {
    /// [`Component::Hosting`] cost.
    pub hosting: Money,

    /// [`Component::Ssl`] cost.
    pub ssl: Money,

    /// [`Component::Cdn`] cost.
    pub cdn: Money,

    /// [`Component::Backups`] cost.
    pub backups: Money,

    /// [`Component::Monitoring`] cost.
    pub monitoring: Money,
}

impl Infrastructure {
    /// Returns the cost of the provided [`Component`].
    #[must_use]
    pub const fn get(&self, component: Component) -> Money {
        match component {
            Component::Hosting => self.hosting,
            Component::Ssl => self.ssl,
            Component::Cdn => self.cdn,
            Component::Backups => self.backups,
            Component::Monitoring => self.monitoring,
        }
    }

    /// Iterates over all the [`Component`]s with their costs, in their
    /// declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Component, Money)> + '_ {
        Component::ALL.iter().map(|&c| (c, self.get(c)))
    }
}

/// Labour and infrastructure split of a project total.
///
/// Amounts are exact decimals. They are never rounded here, only when
/// displayed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Breakdown {
    /// Total this [`Breakdown`] splits.
    pub total: Money,

    /// [`Tier`] this [`Breakdown`] is priced in.
    pub tier: Tier,

    /// Labour part of the total.
    pub labour: Money,

    /// Infrastructure part of the total.
    pub infrastructure_total: Money,

    /// Split of the [`Breakdown::infrastructure_total`].
    pub infrastructure: Infrastructure,
}

impl Breakdown {
    /// Calculates the [`Breakdown`] of the provided `total` in the provided
    /// [`Tier`].
    ///
    /// [`Component::Monitoring`] takes whatever remains after the other
    /// components, so the components always sum to the infrastructure total.
    ///
    /// # Errors
    ///
    /// - [`InvalidArgument::NegativeTotal`] if the `total` is negative.
    /// - [`InvalidArgument::TotalOutOfRange`] if the `total` is too large.
    pub fn calculate(
        total: Money,
        tier: Tier,
    ) -> Result<Self, InvalidArgument> {
        if total.amount.is_sign_negative() && !total.amount.is_zero() {
            return Err(InvalidArgument::NegativeTotal);
        }
        if total.amount > Decimal::from(MAX_TOTAL) {
            return Err(InvalidArgument::TotalOutOfRange);
        }

        let money = |amount| Money {
            amount,
            currency: total.currency,
        };

        let labour = tier.labour_share().of(total.amount);
        let infrastructure_total = total.amount - labour;
        let share = |c: Component| c.share().of(infrastructure_total);
        let (hosting, ssl, cdn, backups) = (
            share(Component::Hosting),
            share(Component::Ssl),
            share(Component::Cdn),
            share(Component::Backups),
        );
        let monitoring = infrastructure_total - hosting - ssl - cdn - backups;

        Ok(Self {
            total,
            tier,
            labour: money(labour),
            infrastructure_total: money(infrastructure_total),
            infrastructure: Infrastructure {
                hosting: money(hosting),
                ssl: money(ssl),
                cdn: money(cdn),
                backups: money(backups),
                monitoring: money(monitoring),
            },
        })
    }

    /// Returns the labour share of this [`Breakdown`].
    #[must_use]
    pub const fn labour_share(&self) -> Percent {
        self.tier.labour_share()
    }

    /// Returns the infrastructure share of this [`Breakdown`].
    #[must_use]
    pub fn infrastructure_share(&self) -> Percent {
        self.labour_share().complement()
    }

    /// Generates the six standard [`LineItem`]s of this [`Breakdown`]: the
    /// labour one first, then one per infrastructure [`Component`].
    ///
    /// The labour [`LineItem`] is described with [`LABOUR_DESCRIPTION`],
    /// unless the `labour` description is provided.
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn line_items(
        &self,
        labour: Option<line_item::Description>,
    ) -> [LineItem; 6] {
        let labour = labour.unwrap_or_else(|| {
            line_item::Description::new(LABOUR_DESCRIPTION)
                .expect("valid labour description")
        });
        let item = |c: Component| {
            LineItem::single(
                c.line_item_description(),
                self.infrastructure.get(c),
            )
        };

        [
            LineItem::single(labour, self.labour),
            item(Component::Hosting),
            item(Component::Ssl),
            item(Component::Cdn),
            item(Component::Backups),
            item(Component::Monitoring),
        ]
    }
}

impl fmt::Display for Breakdown {
    /// Renders the human-readable summary of this [`Breakdown`], with the
    /// amounts rounded to [`common::money::SCALE`] decimal places.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Labour ({:.1}%): {}",
            self.labour_share().value(),
            self.labour.pretty(),
        )?;
        writeln!(
            f,
            "Infrastructure ({:.1}%): {}",
            self.infrastructure_share().value(),
            self.infrastructure_total.pretty(),
        )?;
        for (c, cost) in self.infrastructure.iter() {
            writeln!(
                f,
                "  - {} ({}%): {}",
                c.label(),
                c.share(),
                cost.pretty(),
            )?;
        }
        writeln!(f)?;
        write!(f, "Total: {}", self.total.pretty())
    }
}

#[cfg(test)]
mod spec {
    use common::{Currency, Money};
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    use crate::domain::{line_item, InvalidArgument};

    use super::{Breakdown, Component, Tier, LABOUR_DESCRIPTION};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn zar(s: &str) -> Money {
        Money {
            amount: decimal(s),
            currency: Currency::Zar,
        }
    }

    #[test]
    fn splits_small_total() {
        let b = Breakdown::calculate(zar("2800"), Tier::Small).unwrap();

        assert_eq!(b.labour, zar("840"));
        assert_eq!(b.labour_share().value(), decimal("30"));
        assert_eq!(b.infrastructure_total, zar("1960"));
        assert_eq!(b.infrastructure.hosting, zar("940.80"));
        assert_eq!(b.infrastructure.ssl, zar("431.20"));
        assert_eq!(b.infrastructure.cdn, zar("274.40"));
        assert_eq!(b.infrastructure.backups, zar("117.60"));
        assert_eq!(b.infrastructure.monitoring, zar("196.00"));
    }

    #[test]
    fn rejects_invalid_total() {
        assert_eq!(
            Breakdown::calculate(zar("-0.01"), Tier::Small),
            Err(InvalidArgument::NegativeTotal),
        );
        assert_eq!(
            Breakdown::calculate(zar("1000000000000000.01"), Tier::Small),
            Err(InvalidArgument::TotalOutOfRange),
        );
        assert!(Breakdown::calculate(zar("0"), Tier::Custom).is_ok());
    }

    #[test]
    fn labour_shares() {
        let shares = Tier::ALL
            .iter()
            .map(|t| t.labour_share().value())
            .collect::<Vec<_>>();
        assert_eq!(shares, [30, 35, 45, 50].map(Decimal::from));
        assert_eq!(Tier::default(), Tier::Small);
    }

    #[test]
    fn component_shares_sum_to_hundred() {
        let sum: Decimal =
            Component::ALL.iter().map(|c| c.share().value()).sum();
        assert_eq!(sum, Decimal::ONE_HUNDRED);
    }

    #[test]
    fn suggests_tier_at_boundaries() {
        for (total, tier) in [
            ("0", Tier::Small),
            ("3499.99", Tier::Small),
            ("3500", Tier::Medium),
            ("6999.99", Tier::Medium),
            ("7000", Tier::Large),
            ("14999.99", Tier::Large),
            ("15000", Tier::Custom),
            ("55000", Tier::Custom),
        ] {
            assert_eq!(Tier::suggest(decimal(total)), tier, "total: {total}");
        }
    }

    #[test]
    fn generates_six_line_items() {
        let b = Breakdown::calculate(zar("1200"), Tier::Small).unwrap();
        let items = b.line_items(None);

        assert_eq!(items[0].description().to_string(), LABOUR_DESCRIPTION);
        assert_eq!(
            items[1].description().to_string(),
            "Web Hosting (1 year) - Cloud hosting, 99.9% uptime",
        );
        assert_eq!(
            items[5].description().to_string(),
            "Monitoring & Maintenance (1 year) - Uptime monitoring, \
             technical maintenance",
        );
        assert!(items.iter().all(|i| i.quantity() == Decimal::ONE));
        assert!(items.iter().all(|i| i.amount() == i.unit_price()));

        let sum: Decimal = items.iter().map(|i| i.amount().amount).sum();
        assert_eq!(sum, decimal("1200"));

        let custom = b.line_items(line_item::Description::new("Design"));
        assert_eq!(custom[0].description().to_string(), "Design");
    }

    #[test]
    fn displays_summary() {
        let b = Breakdown::calculate(zar("2800"), Tier::Small).unwrap();

        assert_eq!(
            b.to_string(),
            "Labour (30.0%): R 840.00\n\
             Infrastructure (70.0%): R 1960.00\n  \
             - Web Hosting (48%): R 940.80\n  \
             - SSL & Security (22%): R 431.20\n  \
             - CDN (14%): R 274.40\n  \
             - Automated Backups (6%): R 117.60\n  \
             - Monitoring & Maintenance (10%): R 196.00\n\
             \n\
             Total: R 2800.00",
        );
    }

    prop_compose! {
        fn total()(cents in 0_i64..1_000_000_000_000) -> Money {
            Money { amount: Decimal::new(cents, 2), currency: Currency::Zar }
        }
    }

    fn tier() -> impl Strategy<Value = Tier> {
        prop::sample::select(Tier::ALL)
    }

    proptest! {
        #[test]
        fn labour_and_infrastructure_sum_to_total(
            total in total(),
            tier in tier(),
        ) {
            let b = Breakdown::calculate(total, tier).unwrap();

            prop_assert_eq!(
                b.labour.amount + b.infrastructure_total.amount,
                total.amount,
            );
        }

        #[test]
        fn components_sum_to_infrastructure_total(
            total in total(),
            tier in tier(),
        ) {
            let b = Breakdown::calculate(total, tier).unwrap();
            let sum: Decimal =
                b.infrastructure.iter().map(|(_, m)| m.amount).sum();

            prop_assert_eq!(sum, b.infrastructure_total.amount);
            prop_assert_eq!(
                b.infrastructure.monitoring.amount,
                Component::Monitoring.share().of(b.infrastructure_total.amount),
            );
        }

        #[test]
        fn line_items_sum_to_total(total in total(), tier in tier()) {
            let b = Breakdown::calculate(total, tier).unwrap();
            let sum: Decimal =
                b.line_items(None).iter().map(|i| i.amount().amount).sum();

            prop_assert_eq!(sum, total.amount);
        }
    }
}
