//! [`ClientRevenue`] definition.

use std::collections::BTreeMap;

use common::{
    money,
    operations::{By, Select},
    Currency,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracerr::Traced;

use crate::{
    domain::{client, invoice, Invoice},
    infra::{database, Database},
    read, Query, Service,
};

/// [`Query`] summarizing all the [`Invoice`]s of each client.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ClientRevenue;

/// Row of the [`ClientRevenue`] report.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Row {
    /// ID of the summarized client.
    pub client_id: client::Id,

    /// Number of [`Invoice`]s issued to the client.
    pub invoice_count: u32,

    /// Sum of the issued [`Invoice`]s amounts.
    pub total_invoiced: Decimal,

    /// Sum of the paid [`Invoice`]s amounts.
    pub total_paid: Decimal,

    /// Difference between [`Row::total_invoiced`] and [`Row::total_paid`].
    pub outstanding_balance: Decimal,

    /// [`Currency`] of the amounts in this [`Row`].
    pub currency: Currency,
}

impl<Db> Query<ClientRevenue> for Service<Db>
where
    Db: Database<
        Select<By<Vec<Invoice>, read::invoice::Issued>>,
        Ok = Vec<Invoice>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<Row>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: ClientRevenue) -> Result<Self::Ok, Self::Err> {
        let invoices = self
            .database()
            .execute(Select(By::<Vec<Invoice>, _>::new(
                read::invoice::Issued::default(),
            )))
            .await
            .map_err(tracerr::wrap!())?;

        Ok(summarize(&invoices))
    }
}

/// Summarizes the provided [`Invoice`]s into [`Row`]s, the most invoiced
/// client first.
fn summarize(invoices: &[Invoice]) -> Vec<Row> {
    let mut rows = BTreeMap::<(client::Id, Currency), Row>::new();
    for i in invoices {
        let row = rows
            .entry((i.client_id, i.amount.currency))
            .or_insert_with(|| Row {
                client_id: i.client_id,
                invoice_count: 0,
                total_invoiced: Decimal::ZERO,
                total_paid: Decimal::ZERO,
                outstanding_balance: Decimal::ZERO,
                currency: i.amount.currency,
            });
        row.invoice_count += 1;
        row.total_invoiced += i.amount.amount;
        if i.status == invoice::Status::Paid {
            row.total_paid += i.amount.amount;
        }
    }

    let mut rows = rows
        .into_values()
        .map(|mut r| {
            r.outstanding_balance =
                money::round(r.total_invoiced - r.total_paid);
            r.total_invoiced = money::round(r.total_invoiced);
            r.total_paid = money::round(r.total_paid);
            r
        })
        .collect::<Vec<_>>();
    rows.sort_by(|a, b| b.total_invoiced.cmp(&a.total_invoiced));
    rows
}

#[cfg(test)]
mod spec {
    use crate::domain::{client, invoice};

    use super::{super::spec::invoice, summarize};

    #[test]
    fn orders_by_total_invoiced() {
        let (small, big) = (client::Id::new(), client::Id::new());
        let rows = summarize(&[
            invoice(small, "2025-05-03", "300", invoice::Status::Paid),
            invoice(big, "2025-05-04", "4000", invoice::Status::Paid),
            invoice(big, "2025-06-10", "1500", invoice::Status::Overdue),
        ]);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].client_id, big);
        assert_eq!(rows[0].invoice_count, 2);
        assert_eq!(rows[0].total_invoiced.to_string(), "5500.00");
        assert_eq!(rows[0].total_paid.to_string(), "4000.00");
        assert_eq!(rows[0].outstanding_balance.to_string(), "1500.00");
        assert_eq!(rows[1].client_id, small);
        assert_eq!(rows[1].outstanding_balance.to_string(), "0.00");
    }
}
