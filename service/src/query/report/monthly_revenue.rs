//! [`MonthlyRevenue`] definition.

use std::collections::BTreeMap;

use common::{
    money,
    operations::{By, Select},
    Currency, Date,
};
use rust_decimal::Decimal;
use serde::Serialize;
use smart_default::SmartDefault;
use tracerr::Traced;

use crate::{
    domain::{invoice, Invoice},
    infra::{database, Database},
    read, Query, Service,
};

/// [`Query`] summarizing the [`Invoice`]s issued in each of the last months.
#[derive(Clone, Copy, Debug, Eq, PartialEq, SmartDefault)]
pub struct MonthlyRevenue {
    /// Number of months to summarize, including the current one.
    ///
    /// Clamped into `1..=`[`MonthlyRevenue::MAX_MONTHS`].
    #[default(MonthlyRevenue::MAX_MONTHS)]
    pub months: u8,
}

impl MonthlyRevenue {
    /// Maximum number of months a [`MonthlyRevenue`] may summarize.
    pub const MAX_MONTHS: u8 = 12;
}

/// Row of the [`MonthlyRevenue`] report.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Row {
    /// First day of the summarized month.
    pub month: Date,

    /// Number of [`Invoice`]s issued in the month.
    pub invoice_count: u32,

    /// Sum of the issued [`Invoice`]s amounts.
    pub total_invoiced: Decimal,

    /// Sum of the paid [`Invoice`]s amounts.
    pub total_collected: Decimal,

    /// Difference between [`Row::total_invoiced`] and
    /// [`Row::total_collected`].
    pub outstanding: Decimal,

    /// [`Currency`] of the amounts in this [`Row`].
    pub currency: Currency,
}

impl<Db> Query<MonthlyRevenue> for Service<Db>
where
    Db: Database<
        Select<By<Vec<Invoice>, read::invoice::Issued>>,
        Ok = Vec<Invoice>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<Row>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        MonthlyRevenue { months }: MonthlyRevenue,
    ) -> Result<Self::Ok, Self::Err> {
        let months = months.clamp(1, MonthlyRevenue::MAX_MONTHS);
        let since = (1..months).try_fold(Date::today().first_of_month(), |m, _| {
            m.previous_month()
        });

        let invoices = self
            .database()
            .execute(Select(By::<Vec<Invoice>, _>::new(read::invoice::Issued {
                since: since.map(Date::coerce),
                until: None,
            })))
            .await
            .map_err(tracerr::wrap!())?;

        Ok(summarize(&invoices))
    }
}

/// Summarizes the provided [`Invoice`]s into [`Row`]s, latest month first.
fn summarize(invoices: &[Invoice]) -> Vec<Row> {
    let mut rows = BTreeMap::<(Date, Currency), Row>::new();
    for i in invoices {
        let month = i.date.coerce::<()>().first_of_month();
        let row = rows.entry((month, i.amount.currency)).or_insert_with(|| Row {
            month,
            invoice_count: 0,
            total_invoiced: Decimal::ZERO,
            total_collected: Decimal::ZERO,
            outstanding: Decimal::ZERO,
            currency: i.amount.currency,
        });
        row.invoice_count += 1;
        row.total_invoiced += i.amount.amount;
        if i.status == invoice::Status::Paid {
            row.total_collected += i.amount.amount;
        }
    }
    rows.into_values()
        .rev()
        .map(|mut r| {
            r.outstanding = money::round(r.total_invoiced - r.total_collected);
            r.total_invoiced = money::round(r.total_invoiced);
            r.total_collected = money::round(r.total_collected);
            r
        })
        .collect()
}

#[cfg(test)]
mod spec {
    use crate::domain::{client, invoice};

    use super::{super::spec::invoice, summarize};

    #[test]
    fn summarizes_by_month() {
        let client = client::Id::new();
        let rows = summarize(&[
            invoice(client, "2025-05-03", "1000", invoice::Status::Paid),
            invoice(client, "2025-05-20", "250.5", invoice::Status::Sent),
            invoice(client, "2025-06-01", "99.999", invoice::Status::Draft),
        ]);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].month.to_string(), "2025-06-01");
        assert_eq!(rows[0].invoice_count, 1);
        assert_eq!(rows[0].total_invoiced.to_string(), "100.00");
        assert_eq!(rows[0].outstanding.to_string(), "100.00");

        assert_eq!(rows[1].month.to_string(), "2025-05-01");
        assert_eq!(rows[1].invoice_count, 2);
        assert_eq!(rows[1].total_invoiced.to_string(), "1250.50");
        assert_eq!(rows[1].total_collected.to_string(), "1000.00");
        assert_eq!(rows[1].outstanding.to_string(), "250.50");
    }
}
