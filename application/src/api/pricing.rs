//! Pricing-related definitions.

use common::{Money, Percent};
use derive_more::From;
use juniper::{graphql_object, GraphQLEnum, GraphQLInputObject};
use service::domain::{self, pricing};

use crate::{api, api::scalar, AsError, Context, Error};

/// Pricing tier, determining the labour share of a project total.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "PricingTier")]
pub enum Tier {
    /// Small project (30% labour), like a single page site.
    Small,

    /// Medium project (35% labour), like a business site.
    Medium,

    /// Large project (45% labour), like an online store.
    Large,

    /// Custom project (50% labour), like a mobile application.
    Custom,
}

impl From<pricing::Tier> for Tier {
    fn from(tier: pricing::Tier) -> Self {
        use pricing::Tier as T;
        match tier {
            T::Small => Self::Small,
            T::Medium => Self::Medium,
            T::Large => Self::Large,
            T::Custom => Self::Custom,
        }
    }
}

impl From<Tier> for pricing::Tier {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::Small => Self::Small,
            Tier::Medium => Self::Medium,
            Tier::Large => Self::Large,
            Tier::Custom => Self::Custom,
        }
    }
}

/// Split of a project total into labour and infrastructure costs.
#[derive(Clone, Debug, From)]
pub struct Breakdown(pricing::Breakdown);

/// Split of a project total into labour and infrastructure costs.
#[graphql_object(name = "PricingBreakdown", context = Context)]
impl Breakdown {
    /// Total price of the project.
    #[must_use]
    pub fn total(&self) -> Money {
        self.0.total
    }

    /// `PricingTier` the total is split in.
    #[must_use]
    pub fn tier(&self) -> Tier {
        self.0.tier.into()
    }

    /// Labour part of the total.
    #[must_use]
    pub fn labour_amount(&self) -> Money {
        self.0.labour
    }

    /// Share of the total taken by labour.
    #[must_use]
    pub fn labour_percentage(&self) -> Percent {
        self.0.labour_share()
    }

    /// Infrastructure part of the total.
    #[must_use]
    pub fn infrastructure_total(&self) -> Money {
        self.0.infrastructure_total
    }

    /// Share of the total taken by infrastructure.
    #[must_use]
    pub fn infrastructure_percentage(&self) -> Percent {
        self.0.infrastructure_share()
    }

    /// Itemized infrastructure costs, summing to the `infrastructureTotal`.
    #[must_use]
    pub fn infrastructure_items(&self) -> Vec<InfrastructureItem> {
        self.0
            .infrastructure
            .iter()
            .map(|(component, amount)| InfrastructureItem { component, amount })
            .collect()
    }

    /// Human-readable summary of this `PricingBreakdown`.
    #[must_use]
    pub fn summary(&self) -> String {
        self.0.to_string()
    }
}

/// Single infrastructure cost of a [`Breakdown`].
#[derive(Clone, Copy, Debug)]
pub struct InfrastructureItem {
    /// Priced [`pricing::Component`].
    component: pricing::Component,

    /// Price of the [`pricing::Component`].
    amount: Money,
}

/// Single infrastructure cost of a `PricingBreakdown`.
#[graphql_object(context = Context)]
impl InfrastructureItem {
    /// Human-readable label of this cost, like `SSL Certificate`.
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.component.label()
    }

    /// What this cost covers.
    #[must_use]
    pub fn summary(&self) -> &'static str {
        self.component.summary()
    }

    /// Share of the infrastructure total taken by this cost.
    #[must_use]
    pub fn percentage(&self) -> Percent {
        self.component.share()
    }

    /// Price of this cost.
    #[must_use]
    pub fn amount(&self) -> Money {
        self.amount
    }
}

/// Typical project with a fixed total.
#[derive(Clone, Copy, Debug, From)]
pub struct Preset(&'static pricing::Preset);

/// Typical project with a fixed total.
#[graphql_object(name = "PricingPreset", context = Context)]
impl Preset {
    /// Stable key of this `PricingPreset`.
    #[must_use]
    pub fn key(&self) -> &'static str {
        self.0.key
    }

    /// Human-readable name of this `PricingPreset`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.0.name
    }

    /// Human-readable category of this `PricingPreset`.
    #[must_use]
    pub fn category(&self) -> &'static str {
        self.0.category.label()
    }

    /// What a project of this `PricingPreset` delivers.
    #[must_use]
    pub fn description(&self) -> &'static str {
        self.0.description
    }

    /// `PricingTier` of this `PricingPreset`.
    #[must_use]
    pub fn tier(&self) -> Tier {
        self.0.tier.into()
    }

    /// `PricingBreakdown` of this `PricingPreset` in the default currency.
    pub fn breakdown(&self, ctx: &Context) -> Result<Breakdown, Error> {
        self.0
            .breakdown(ctx.service().config().currency)
            .map(Into::into)
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }
}

/// Line of a document.
#[derive(Clone, Debug, From)]
pub struct LineItem(domain::LineItem);

/// Line of a document.
#[graphql_object(context = Context)]
impl LineItem {
    /// Description of this `LineItem`.
    #[must_use]
    pub fn description(&self) -> String {
        self.0.description().to_string()
    }

    /// Quantity of this `LineItem`.
    #[must_use]
    pub fn quantity(&self) -> scalar::Decimal {
        self.0.quantity().into()
    }

    /// Price of a single unit of this `LineItem`.
    #[must_use]
    pub fn unit_price(&self) -> Money {
        self.0.unit_price()
    }

    /// Amount of this `LineItem`, being its `quantity` times its `unitPrice`.
    #[must_use]
    pub fn amount(&self) -> Money {
        self.0.amount()
    }
}

/// Line of a document to be priced.
#[derive(Clone, Debug, GraphQLInputObject)]
pub struct LineItemInput {
    /// Description of the line.
    pub description: String,

    /// Quantity of the line, greater than zero.
    pub quantity: scalar::Decimal,

    /// Non-negative price of a single unit of the line.
    pub unit_price: scalar::Decimal,
}

impl LineItemInput {
    /// Converts this [`LineItemInput`] into a [`domain::LineItem`] priced in
    /// the provided [`common::Currency`].
    ///
    /// # Errors
    ///
    /// If the description is blank, or the amounts are out of range.
    pub(crate) fn into_line_item(
        self,
        currency: common::Currency,
    ) -> Result<domain::LineItem, Error> {
        let description = self.description.parse().map_err(|_| {
            Error::from(api::FormError::Invalid)
                .with_detail("description", "cannot be blank")
        })?;
        domain::LineItem::new(
            description,
            self.quantity.into(),
            Money {
                amount: self.unit_price.into(),
                currency,
            },
        )
        .map_err(AsError::into_error)
    }
}

/// Totals of a document.
#[derive(Clone, Copy, Debug, From)]
pub struct Totals(domain::Totals);

/// Totals of a document.
#[graphql_object(name = "DocumentTotals", context = Context)]
impl Totals {
    /// Sum of all the `LineItem` amounts.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.0.subtotal
    }

    /// Discount applied to the `subtotal`.
    #[must_use]
    pub fn discount_percentage(&self) -> Percent {
        self.0.discount
    }

    /// Discounted part of the `subtotal`, rounded to cents.
    #[must_use]
    pub fn discount_amount(&self) -> Money {
        self.0.discount_amount
    }

    /// `subtotal` minus the `discountAmount`.
    #[must_use]
    pub fn total(&self) -> Money {
        self.0.total
    }
}
