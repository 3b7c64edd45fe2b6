//! GraphQL [`Query`]s definitions.

use common::{Money, Percent};
use juniper::graphql_object;
use service::{
    domain::{self, pricing},
    query, Query as _,
};

use crate::{api, api::scalar, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Splits the provided `total` into labour and infrastructure costs.
    ///
    /// `SMALL` `PricingTier` is used, unless another one is provided.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_ARGUMENT` - the `total` is negative or too large.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "pricingBreakdown",
            otel.name = Self::SPAN_NAME,
            tier = ?tier,
            total = %total,
        ),
    )]
    pub fn pricing_breakdown(
        total: scalar::Decimal,
        tier: Option<api::pricing::Tier>,
        ctx: &Context,
    ) -> Result<api::pricing::Breakdown, Error> {
        breakdown(total, tier, ctx).map(Into::into)
    }

    /// Suggests the `PricingTier` fitting a project of the provided `total`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "suggestPricingTier",
            otel.name = Self::SPAN_NAME,
            total = %total,
        ),
    )]
    #[must_use]
    pub fn suggest_pricing_tier(
        total: scalar::Decimal,
    ) -> api::pricing::Tier {
        pricing::Tier::suggest(total.into()).into()
    }

    /// Lists all the `PricingPreset`s.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "pricingPresets",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn pricing_presets() -> Vec<api::pricing::Preset> {
        pricing::Preset::ALL.iter().map(Into::into).collect()
    }

    /// Returns the `PricingPreset` with the provided `key`, if any.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "pricingPreset",
            key = %key,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn pricing_preset(key: String) -> Option<api::pricing::Preset> {
        pricing::Preset::find(&key).map(Into::into)
    }

    /// Generates the six standard `LineItem`s of a project of the provided
    /// `total`: the labour one first, then one per infrastructure cost.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_ARGUMENT` - the `total` is negative or too large;
    /// - `INVALID_FORM` - the `labourDescription` is blank.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "standardLineItems",
            otel.name = Self::SPAN_NAME,
            tier = ?tier,
            total = %total,
        ),
    )]
    pub fn standard_line_items(
        total: scalar::Decimal,
        tier: Option<api::pricing::Tier>,
        labour_description: Option<String>,
        ctx: &Context,
    ) -> Result<Vec<api::pricing::LineItem>, Error> {
        let labour = labour_description
            .map(|d| {
                d.parse::<domain::line_item::Description>().map_err(|_| {
                    let mut err = Error::from(api::FormError::Invalid);
                    err.message
                        .push_str("\n- `labourDescription`: cannot be blank");
                    err
                })
            })
            .transpose()
            .map_err(ctx.error())?;

        Ok(breakdown(total, tier, ctx)?
            .line_items(labour)
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Computes the `DocumentTotals` of the provided `LineItem`s with the
    /// provided `discount` applied.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_ARGUMENT` - the `LineItem`s have invalid amounts;
    /// - `INVALID_FORM` - a `LineItem` description is blank.
    #[tracing::instrument(
        skip_all,
        fields(
            discount = ?discount,
            gql.name = "documentTotals",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub fn document_totals(
        items: Vec<api::pricing::LineItemInput>,
        discount: Option<Percent>,
        ctx: &Context,
    ) -> Result<api::pricing::Totals, Error> {
        let currency = ctx.service().config().currency;
        let items = items
            .into_iter()
            .map(|i| i.into_line_item(currency))
            .collect::<Result<Vec<_>, _>>()
            .map_err(ctx.error())?;

        domain::Totals::compute(
            &items,
            discount.unwrap_or(Percent::ZERO),
            currency,
        )
        .map(Into::into)
        .map_err(AsError::into_error)
        .map_err(ctx.error())
    }

    /// Previews the `DocumentNumber` the next created `Invoice` would get,
    /// without reserving it.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "nextInvoiceNumber",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn next_invoice_number(
        ctx: &Context,
    ) -> Result<api::Number, Error> {
        ctx.service()
            .execute(query::NextInvoiceNumber)
            .await
            .map(Into::into)
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }

    /// Previews the `DocumentNumber` the next created `Quotation` would get,
    /// without reserving it.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "nextQuotationNumber",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn next_quotation_number(
        ctx: &Context,
    ) -> Result<api::Number, Error> {
        ctx.service()
            .execute(query::NextQuotationNumber)
            .await
            .map(Into::into)
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }

    /// Returns the `Quotation` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `QUOTATION_NOT_EXISTS` - the `Quotation` with the specified ID does
    ///                            not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "quotation",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn quotation(
        id: api::quotation::Id,
        ctx: &Context,
    ) -> Result<api::Quotation, Error> {
        ctx.service()
            .execute(query::quotation::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| QuotationError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Invoice` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVOICE_NOT_EXISTS` - the `Invoice` with the specified ID does not
    ///                          exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "invoice",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn invoice(
        id: api::invoice::Id,
        ctx: &Context,
    ) -> Result<api::Invoice, Error> {
        ctx.service()
            .execute(query::invoice::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| InvoiceError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Lists the `Quotation`s, optionally only the ones in the specified
    /// `QuotationStatus`, the most recently issued first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "quotations",
            otel.name = Self::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn quotations(
        status: Option<api::quotation::Status>,
        ctx: &Context,
    ) -> Result<Vec<api::Quotation>, Error> {
        let filter = service::read::quotation::list::Filter {
            status: status.map(Into::into),
        };
        ctx.service()
            .execute(query::quotations::List::by(filter))
            .await
            .map(|list| list.into_iter().map(Into::into).collect())
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }

    /// Lists the `Invoice`s, optionally only the ones in the specified
    /// `InvoiceStatus` or billed to the specified client, the most recently
    /// issued first.
    #[tracing::instrument(
        skip_all,
        fields(
            client_id = ?client_id,
            gql.name = "invoices",
            otel.name = Self::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn invoices(
        status: Option<api::invoice::Status>,
        client_id: Option<api::ClientId>,
        ctx: &Context,
    ) -> Result<Vec<api::Invoice>, Error> {
        let filter = service::read::invoice::list::Filter {
            status: status.map(Into::into),
            client_id: client_id.map(Into::into),
        };
        ctx.service()
            .execute(query::invoices::List::by(filter))
            .await
            .map(|list| list.into_iter().map(Into::into).collect())
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }

    /// Summarizes the `Invoice`s issued in each of the last `months`
    /// (12 by default, at most), the latest month first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "monthlyRevenueReport",
            months = ?months,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn monthly_revenue_report(
        months: Option<i32>,
        ctx: &Context,
    ) -> Result<Vec<api::report::MonthlyRevenueRow>, Error> {
        let report = months.map_or_else(query::MonthlyRevenue::default, |m| {
            query::MonthlyRevenue {
                months: u8::try_from(m.max(0)).unwrap_or(u8::MAX),
            }
        });
        ctx.service()
            .execute(report)
            .await
            .map(|rows| rows.into_iter().map(Into::into).collect())
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }

    /// Summarizes all the `Invoice`s of each client, the most invoiced client
    /// first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "clientRevenueReport",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn client_revenue_report(
        ctx: &Context,
    ) -> Result<Vec<api::report::ClientRevenueRow>, Error> {
        ctx.service()
            .execute(query::ClientRevenue)
            .await
            .map(|rows| rows.into_iter().map(Into::into).collect())
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }
}

/// Calculates the [`pricing::Breakdown`] of the provided `total` priced in the
/// configured [`common::Currency`].
fn breakdown(
    total: scalar::Decimal,
    tier: Option<api::pricing::Tier>,
    ctx: &Context,
) -> Result<pricing::Breakdown, Error> {
    pricing::Breakdown::calculate(
        Money {
            amount: total.into(),
            currency: ctx.service().config().currency,
        },
        tier.map_or(pricing::Tier::Small, Into::into),
    )
    .map_err(AsError::into_error)
    .map_err(ctx.error())
}

define_error! {
    enum QuotationError {
        #[code = "QUOTATION_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Quotation` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum InvoiceError {
        #[code = "INVOICE_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Invoice` with the specified ID does not exist"]
        NotExists,
    }
}
