//! [`Preset`] definitions.

use common::{define_kind, Money};
use rust_decimal::Decimal;

use crate::domain::InvalidArgument;

use super::{Breakdown, Tier};

/// Typical project priced with a fixed total in some [`Tier`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Preset {
    /// Stable key of this [`Preset`].
    pub key: &'static str,

    /// Human-readable name of this [`Preset`].
    pub name: &'static str,

    /// [`Category`] of this [`Preset`].
    pub category: Category,

    /// What a project of this [`Preset`] delivers.
    pub description: &'static str,

    /// Total price of this [`Preset`], in the default currency.
    pub total: Decimal,

    /// [`Tier`] this [`Preset`] is priced in.
    pub tier: Tier,
}

/// Shortcut for a whole [`Decimal`] in a `const` context.
const fn whole(val: u32) -> Decimal {
    Decimal::from_parts(val, 0, 0, false, 0)
}

impl Preset {
    /// All the available [`Preset`]s, from the cheapest to the most expensive.
    pub const ALL: &'static [Self] = &[
        Self {
            key: "personal_single",
            name: "Personal (Single Page)",
            category: Category::Websites,
            description: "Basic landing page, single page portfolio",
            total: whole(1_200),
            tier: Tier::Small,
        },
        Self {
            key: "portfolio_multi",
            name: "Portfolio (Multi Page 3+)",
            category: Category::Websites,
            description: "Multi-page portfolio, gallery, contact form",
            total: whole(3_000),
            tier: Tier::Small,
        },
        Self {
            key: "business_starter",
            name: "Business Starter",
            category: Category::Websites,
            description: "Small business website, 5-10 pages",
            total: whole(6_800),
            tier: Tier::Medium,
        },
        Self {
            key: "business_pro",
            name: "Business Pro",
            category: Category::Websites,
            description: "Professional business site, advanced features",
            total: whole(11_250),
            tier: Tier::Medium,
        },
        Self {
            key: "ecommerce_basic",
            name: "E-commerce Basic",
            category: Category::ECommerce,
            description:
                "Basic online store, product catalog, payment integration",
            total: whole(15_000),
            tier: Tier::Large,
        },
        Self {
            key: "ecommerce_advanced",
            name: "E-commerce Advanced",
            category: Category::ECommerce,
            description:
                "Full-featured store, inventory management, advanced features",
            total: whole(25_000),
            tier: Tier::Large,
        },
        Self {
            key: "mobile_mvp",
            name: "Mobile App MVP",
            category: Category::MobileApps,
            description: "Cross-platform mobile app, minimum viable product",
            total: whole(25_000),
            tier: Tier::Custom,
        },
        Self {
            key: "mobile_fpa",
            name: "Mobile App FPA",
            category: Category::MobileApps,
            description: "Full production app, cross-platform, complete features",
            total: whole(55_000),
            tier: Tier::Custom,
        },
    ];

    /// Looks up the [`Preset`] with the provided `key`.
    #[must_use]
    pub fn find(key: &str) -> Option<&'static Self> {
        Self::ALL.iter().find(|p| p.key == key)
    }

    /// Calculates the [`Breakdown`] of this [`Preset`] priced in the provided
    /// `currency`.
    ///
    /// # Errors
    ///
    /// See [`Breakdown::calculate()`].
    pub fn breakdown(
        &self,
        currency: common::Currency,
    ) -> Result<Breakdown, InvalidArgument> {
        Breakdown::calculate(
            Money {
                amount: self.total,
                currency,
            },
            self.tier,
        )
    }
}

define_kind! {
    #[doc = "Category of a [`Preset`]."]
    #[serialize_all = "snake_case"]
    enum Category {
        #[doc = "Websites."]
        Websites = 1,

        #[doc = "Online stores."]
        ECommerce = 2,

        #[doc = "Mobile applications."]
        MobileApps = 3,
    }
}

impl Category {
    /// Returns the human-readable label of this [`Category`].
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Websites => "Websites",
            Self::ECommerce => "E-commerce",
            Self::MobileApps => "Mobile Apps",
        }
    }
}

#[cfg(test)]
mod spec {
    use common::Currency;
    use rust_decimal::Decimal;

    use crate::domain::pricing::Tier;

    use super::Preset;

    #[test]
    fn ordered_by_total() {
        assert!(Preset::ALL.windows(2).all(|w| w[0].total <= w[1].total));
    }

    #[test]
    fn finds_by_key() {
        let p = Preset::find("business_pro").unwrap();
        assert_eq!(p.total, Decimal::from(11_250));
        assert_eq!(p.tier, Tier::Medium);
        assert!(Preset::find("unknown").is_none());
    }

    #[test]
    fn breaks_down() {
        let b = Preset::find("personal_single")
            .unwrap()
            .breakdown(Currency::Zar)
            .unwrap();
        assert_eq!(b.labour.amount, Decimal::from(360));
        assert_eq!(b.infrastructure_total.amount, Decimal::from(840));
    }
}
