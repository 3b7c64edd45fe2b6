//! [`Command`] for completing a partially stored [`Conversion`].

use std::iter;

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted, Update},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        document::Scope,
        quotation::{self, Conversion},
        InvalidArgument, Invoice, Quotation,
    },
    infra::{database, database::constraint, Database},
    read, Service,
};

use super::{convert_quotation, store_numbered, Command, NumberingConflict};

/// [`Command`] for completing a [`Conversion`] of a [`Quotation`], whose
/// [`Half`] went missing from the [`Database`].
///
/// - A missing [`Half::QuotationMark`] is restored by marking the
///   [`Quotation`] as converted into the existing [`Invoice`].
/// - A missing [`Half::Invoice`] is restored by converting the [`Quotation`]
///   once again, keeping the [`Invoice`] ID it is marked with.
///
/// [`Half`]: quotation::Half
/// [`Half::Invoice`]: quotation::Half::Invoice
/// [`Half::QuotationMark`]: quotation::Half::QuotationMark
#[derive(Clone, Copy, Debug)]
pub struct CompleteConversion {
    /// ID of the [`Quotation`] to complete the [`Conversion`] of.
    pub quotation_id: quotation::Id,
}

impl<Db> Command<CompleteConversion> for Service<Db>
where
    Db: Database<
            Select<By<Option<Quotation>, quotation::Id>>,
            Ok = Option<Quotation>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Invoice>, quotation::Id>>,
            Ok = Option<Invoice>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<read::invoice::Numbers, Scope>>,
            Ok = read::invoice::Numbers,
            Err = Traced<database::Error>,
        > + Database<Update<Quotation>, Err = Traced<database::Error>>
        + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Invoice>, Err = Traced<database::Error>>
        + Database<Update<Quotation>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Conversion;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CompleteConversion,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CompleteConversion { quotation_id } = cmd;
        let db = self.database();

        let mut quotation = db
            .execute(Select(By::<Option<Quotation>, _>::new(quotation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| tracerr::new!(E::QuotationNotExists(quotation_id)))?;
        let invoice = db
            .execute(Select(By::<Option<Invoice>, _>::new(quotation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        match (quotation.invoice_id, invoice) {
            (None, None) => Err(tracerr::new!(E::NotConverted(quotation_id))),
            (Some(marked), Some(i)) if marked == i.id => {
                Err(tracerr::new!(E::NothingToComplete(quotation_id)))
            }
            (_, Some(invoice)) => {
                quotation.invoice_id = Some(invoice.id);
                quotation.status = quotation::Status::Accepted;
                db.execute(Update(quotation.clone()))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;

                log::info!(
                    quotation = %quotation.number,
                    invoice = %invoice.number,
                    "restored quotation mark of conversion",
                );
                Ok(Conversion { invoice, quotation })
            }
            (Some(marked), None) => {
                let mut conversion = quotation
                    .convert(
                        &self.config().numbering.invoice_prefix,
                        iter::empty::<&str>(),
                        Date::today(),
                        self.config().terms.payment_term,
                    )
                    .map_err(|e| tracerr::new!(E::InvalidArgument(e)))?;
                conversion.invoice.id = marked;
                conversion.quotation.invoice_id = Some(marked);

                let conversion = store_numbered(
                    db,
                    conversion.invoice.number.scope().clone(),
                    None,
                    self.config().numbering.max_attempts,
                    constraint::INVOICE_NUMBER,
                    move |number| {
                        let mut conversion = conversion.clone();
                        conversion.invoice.number = number;
                        convert_quotation::store(db, conversion)
                    },
                )
                .await?;

                log::info!(
                    quotation = %conversion.quotation.number,
                    invoice = %conversion.invoice.number,
                    "restored invoice of conversion",
                );
                Ok(conversion)
            }
        }
    }
}

/// Error of [`CompleteConversion`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Quotation`] with the provided ID doesn't exist.
    #[display("`Quotation(id: {_0})` doesn't exist")]
    QuotationNotExists(#[error(not(source))] quotation::Id),

    /// [`Quotation`] with the provided ID was never converted.
    #[display("`Quotation(id: {_0})` is not converted")]
    NotConverted(#[error(not(source))] quotation::Id),

    /// [`Conversion`] of the [`Quotation`] with the provided ID is complete
    /// already.
    #[display("`Quotation(id: {_0})` conversion is complete already")]
    NothingToComplete(#[error(not(source))] quotation::Id),

    /// [`Quotation`] cannot be totalled.
    #[display("Invalid `Quotation`: {_0}")]
    InvalidArgument(InvalidArgument),

    /// Allocated [`invoice::Number`] is already taken.
    ///
    /// [`invoice::Number`]: crate::domain::invoice::Number
    #[display("{_0}")]
    #[from]
    NumberingConflict(NumberingConflict),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select, Update};

    use crate::{
        command::{
            spec::{number, quotation_draft, service},
            ConvertQuotation, CreateQuotation,
        },
        domain::{invoice, quotation, Invoice},
        infra::Database as _,
        Command as _,
    };

    use super::{CompleteConversion, ExecutionError};

    #[tokio::test]
    async fn restores_missing_invoice() {
        let svc = service();
        let mut q = svc
            .execute(CreateQuotation {
                draft: quotation_draft(&[("Hosting", 12, 125)]),
            })
            .await
            .unwrap();
        let marked = invoice::Id::new();
        q.invoice_id = Some(marked);
        svc.database().execute(Update(q.clone())).await.unwrap();

        let c = svc
            .execute(CompleteConversion { quotation_id: q.id })
            .await
            .unwrap();

        assert_eq!(c.invoice.id, marked);
        assert_eq!(c.invoice.number.to_string(), number("MZK", 1));
        assert_eq!(c.invoice.amount.amount, 1500.into());
        assert_eq!(c.quotation.invoice_id, Some(marked));
        assert_eq!(c.quotation.status, quotation::Status::Accepted);

        let stored = svc
            .database()
            .execute(Select(By::<Option<Invoice>, _>::new(marked)))
            .await
            .unwrap();
        assert_eq!(stored, Some(c.invoice));
    }

    #[tokio::test]
    async fn restores_missing_quotation_mark() {
        let svc = service();
        let q = svc
            .execute(CreateQuotation {
                draft: quotation_draft(&[("Hosting", 12, 125)]),
            })
            .await
            .unwrap();
        let converted = svc
            .execute(ConvertQuotation { quotation_id: q.id })
            .await
            .unwrap();
        svc.database().execute(Update(q.clone())).await.unwrap();

        let c = svc
            .execute(CompleteConversion { quotation_id: q.id })
            .await
            .unwrap();

        assert_eq!(c.invoice, converted.invoice);
        assert_eq!(c.quotation.invoice_id, Some(converted.invoice.id));
        assert_eq!(c.quotation.status, quotation::Status::Accepted);

        let err = svc
            .execute(CompleteConversion { quotation_id: q.id })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NothingToComplete(_)));
    }

    #[tokio::test]
    async fn refuses_not_converted() {
        let svc = service();
        let q = svc
            .execute(CreateQuotation {
                draft: quotation_draft(&[("Hosting", 12, 125)]),
            })
            .await
            .unwrap();

        let err = svc
            .execute(CompleteConversion { quotation_id: q.id })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::NotConverted(id) if *id == q.id,
        ));
    }
}
