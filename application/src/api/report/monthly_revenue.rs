//! [`MonthlyRevenue`] report definition.

use common::{Date, Money};
use derive_more::From;
use juniper::graphql_object;
use service::query;

#[cfg(doc)]
use service::query::MonthlyRevenue;

use crate::{api, Context};

/// Row of a [`MonthlyRevenue`] report.
#[derive(Clone, Debug, From)]
pub struct Row(query::report::monthly_revenue::Row);

impl Row {
    /// Prices the provided `amount` in the [`common::Currency`] of this
    /// [`Row`].
    fn money(&self, amount: rust_decimal::Decimal) -> Money {
        Money {
            amount,
            currency: self.0.currency,
        }
    }
}

/// Revenue of the `Invoice`s issued in a single month.
#[graphql_object(name = "MonthlyRevenueReportRow", context = Context)]
impl Row {
    /// First day of the summarized month.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "MonthlyRevenueReportRow.month",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn month(&self) -> Date {
        self.0.month
    }

    /// Number of `Invoice`s issued in the month.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "MonthlyRevenueReportRow.invoiceCount",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn invoice_count(&self) -> i32 {
        i32::try_from(self.0.invoice_count).unwrap_or(i32::MAX)
    }

    /// Sum of the issued `Invoice`s amounts.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "MonthlyRevenueReportRow.totalInvoiced",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn total_invoiced(&self) -> Money {
        self.money(self.0.total_invoiced)
    }

    /// Sum of the paid `Invoice`s amounts.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "MonthlyRevenueReportRow.totalCollected",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn total_collected(&self) -> Money {
        self.money(self.0.total_collected)
    }

    /// Part of the `totalInvoiced` not collected yet.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "MonthlyRevenueReportRow.outstanding",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn outstanding(&self) -> Money {
        self.money(self.0.outstanding)
    }
}
