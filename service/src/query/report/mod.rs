//! Revenue report [`Query`]s.
//!
//! [`Query`]: crate::Query

pub mod client_revenue;
pub mod monthly_revenue;

pub use self::{
    client_revenue::ClientRevenue, monthly_revenue::MonthlyRevenue,
};

#[cfg(test)]
mod spec {
    //! Shared fixtures of report specs.

    use common::{Currency, Date, Money};

    use crate::domain::{client, invoice, Invoice};

    pub(crate) fn invoice(
        client_id: client::Id,
        date: &str,
        amount: &str,
        status: invoice::Status,
    ) -> Invoice {
        let date: Date = date.parse().unwrap();
        invoice::Draft {
            number: None,
            client_id,
            project_id: None,
            amount: Money {
                amount: amount.parse().unwrap(),
                currency: Currency::Zar,
            },
            date: date.coerce(),
            due_date: date.coerce(),
            status,
            description: invoice::Description::new("Website redesign")
                .unwrap(),
            notes: None,
        }
        .into_invoice("MZK-2025-001".parse().unwrap())
    }
}
