//! [`Command`] for updating an [`invoice::Status`].

use common::{
    operations::{By, Select, Update},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{invoice, Invoice},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for updating an [`invoice::Status`].
///
/// Marking an [`Invoice`] as [`Paid`] records the current [`Date`] as its
/// payment date, any other [`invoice::Status`] clears it.
///
/// [`Paid`]: invoice::Status::Paid
#[derive(Clone, Copy, Debug)]
pub struct UpdateInvoiceStatus {
    /// ID of the [`Invoice`] to update.
    pub invoice_id: invoice::Id,

    /// New [`invoice::Status`] of the [`Invoice`].
    pub status: invoice::Status,
}

impl<Db> Command<UpdateInvoiceStatus> for Service<Db>
where
    Db: Database<
            Select<By<Option<Invoice>, invoice::Id>>,
            Ok = Option<Invoice>,
            Err = Traced<database::Error>,
        > + Database<Update<Invoice>, Err = Traced<database::Error>>,
{
    type Ok = Invoice;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateInvoiceStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateInvoiceStatus { invoice_id, status } = cmd;

        let mut invoice = self
            .database()
            .execute(Select(By::<Option<Invoice>, _>::new(invoice_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| tracerr::new!(E::InvoiceNotExists(invoice_id)))?;
        if invoice.status == status {
            return Ok(invoice);
        }

        invoice.set_status(status, Date::today());
        self.database()
            .execute(Update(invoice.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(|_| invoice)
    }
}

/// Error of [`UpdateInvoiceStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Invoice`] with the provided ID doesn't exist.
    #[display("`Invoice(id: {_0})` doesn't exist")]
    InvoiceNotExists(#[error(not(source))] invoice::Id),
}

#[cfg(test)]
mod spec {
    use common::Date;

    use crate::{
        command::{
            spec::{quotation_draft, service},
            ConvertQuotation, CreateQuotation,
        },
        domain::invoice,
        Command as _,
    };

    use super::{ExecutionError, UpdateInvoiceStatus};

    #[tokio::test]
    async fn records_payment_date() {
        let svc = service();
        let q = svc
            .execute(CreateQuotation {
                draft: quotation_draft(&[("Hosting", 12, 125)]),
            })
            .await
            .unwrap();
        let c = svc
            .execute(ConvertQuotation { quotation_id: q.id })
            .await
            .unwrap();

        let paid = svc
            .execute(UpdateInvoiceStatus {
                invoice_id: c.invoice.id,
                status: invoice::Status::Paid,
            })
            .await
            .unwrap();
        assert_eq!(paid.paid_date, Some(Date::today().coerce()));

        let sent = svc
            .execute(UpdateInvoiceStatus {
                invoice_id: c.invoice.id,
                status: invoice::Status::Sent,
            })
            .await
            .unwrap();
        assert_eq!(sent.status, invoice::Status::Sent);
        assert_eq!(sent.paid_date, None);
    }

    #[tokio::test]
    async fn refuses_unknown_invoice() {
        let svc = service();

        let err = svc
            .execute(UpdateInvoiceStatus {
                invoice_id: invoice::Id::new(),
                status: invoice::Status::Paid,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::InvoiceNotExists(_)));
    }
}
