//! [`ClientRevenue`] report definition.

use common::Money;
use derive_more::From;
use juniper::graphql_object;
use service::query;

#[cfg(doc)]
use service::query::ClientRevenue;

use crate::{api, Context};

/// Row of a [`ClientRevenue`] report.
#[derive(Clone, Debug, From)]
pub struct Row(query::report::client_revenue::Row);

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

/// Revenue of all the `Invoice`s issued to a single client.
#[graphql_object(name = "ClientRevenueReportRow", context = Context)]
impl Row {
    /// ID of the summarized client.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "ClientRevenueReportRow.clientId",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn client_id(&self) -> api::ClientId {
        self.0.client_id.into()
    }

    /// Number of `Invoice`s issued to the client.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "ClientRevenueReportRow.invoiceCount",
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
            gql.name = "ClientRevenueReportRow.totalInvoiced",
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
            gql.name = "ClientRevenueReportRow.totalPaid",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn total_paid(&self) -> Money {
        self.money(self.0.total_paid)
    }

    /// Part of the `totalInvoiced` not paid yet.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "ClientRevenueReportRow.outstandingBalance",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn outstanding_balance(&self) -> Money {
        self.money(self.0.outstanding_balance)
    }
}
