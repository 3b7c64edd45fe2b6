//! [`Command`] for converting a [`Quotation`] into an [`Invoice`].

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
        invoice,
        quotation::{self, Conversion, Half},
        InvalidArgument, Invoice, Quotation,
    },
    infra::{database, database::constraint, Database},
    read, Service,
};

use super::{store_numbered, Command, NumberingConflict};

/// [`Command`] for converting a [`Quotation`] into a new draft [`Invoice`].
///
/// The [`Invoice`] is stored along with the [`Quotation`] becoming
/// [`Accepted`] in a single transaction, so either both of them are stored,
/// or none.
///
/// [`Accepted`]: quotation::Status::Accepted
#[derive(Clone, Copy, Debug)]
pub struct ConvertQuotation {
    /// ID of the [`Quotation`] to convert.
    pub quotation_id: quotation::Id,
}

impl<Db> Command<ConvertQuotation> for Service<Db>
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
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Invoice>, Err = Traced<database::Error>>
        + Database<Update<Quotation>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Conversion;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ConvertQuotation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ConvertQuotation { quotation_id } = cmd;
        let db = self.database();

        let quotation = db
            .execute(Select(By::<Option<Quotation>, _>::new(quotation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| tracerr::new!(E::QuotationNotExists(quotation_id)))?;
        let invoice = db
            .execute(Select(By::<Option<Invoice>, _>::new(quotation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        match (quotation.invoice_id, invoice.map(|i| i.id)) {
            (Some(marked), Some(id)) if marked == id => {
                return Err(tracerr::new!(E::AlreadyConverted(id)));
            }
            (_, Some(_)) => {
                return Err(tracerr::new!(E::IncompleteConversion {
                    missing: Half::QuotationMark,
                }));
            }
            (Some(_), None) => {
                return Err(tracerr::new!(E::IncompleteConversion {
                    missing: Half::Invoice,
                }));
            }
            (None, None) => {}
        }

        // Renumbered on every attempt below.
        let conversion = quotation
            .convert(
                &self.config().numbering.invoice_prefix,
                iter::empty::<&str>(),
                Date::today(),
                self.config().terms.payment_term,
            )
            .map_err(|e| tracerr::new!(E::InvalidArgument(e)))?;

        let conversion = store_numbered(
            db,
            conversion.invoice.number.scope().clone(),
            None,
            self.config().numbering.max_attempts,
            constraint::INVOICE_NUMBER,
            move |number| {
                let mut conversion = conversion.clone();
                conversion.invoice.number = number;
                store(db, conversion)
            },
        )
        .await?;

        log::info!(
            quotation = %conversion.quotation.number,
            invoice = %conversion.invoice.number,
            "converted quotation into invoice",
        );
        Ok(conversion)
    }
}

/// Stores both halves of the provided [`Conversion`] in a single transaction.
pub(super) async fn store<Db>(
    db: &Db,
    conversion: Conversion,
) -> Result<Conversion, Traced<database::Error>>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Invoice>, Err = Traced<database::Error>>
        + Database<Update<Quotation>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    let tx = db.execute(Transact).await.map_err(tracerr::wrap!())?;
    tx.execute(Insert(conversion.invoice.clone()))
        .await
        .map_err(tracerr::wrap!())
        .map(drop)?;
    tx.execute(Update(conversion.quotation.clone()))
        .await
        .map_err(tracerr::wrap!())
        .map(drop)?;
    tx.execute(Commit)
        .await
        .map_err(tracerr::wrap!())
        .map(|_| conversion)
}

/// Error of [`ConvertQuotation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Quotation`] with the provided ID doesn't exist.
    #[display("`Quotation(id: {_0})` doesn't exist")]
    QuotationNotExists(#[error(not(source))] quotation::Id),

    /// [`Quotation`] is already converted into the [`Invoice`] with the
    /// provided ID.
    #[display("`Quotation` is already converted into `Invoice(id: {_0})`")]
    AlreadyConverted(#[error(not(source))] invoice::Id),

    /// [`Quotation`] was converted only partially.
    #[display("`Quotation` conversion is incomplete, `{missing}` is missing")]
    IncompleteConversion {
        /// Missing [`Half`] of the [`Conversion`].
        missing: Half,
    },

    /// [`Quotation`] cannot be totalled.
    #[display("Invalid `Quotation`: {_0}")]
    InvalidArgument(InvalidArgument),

    /// Allocated [`invoice::Number`] is already taken.
    #[display("{_0}")]
    #[from]
    NumberingConflict(NumberingConflict),
}

#[cfg(test)]
mod spec {
    use std::iter;

    use common::{
        operations::{By, Select, Update},
        Date, Percent,
    };

    use crate::{
        command::{
            spec::{number, quotation_draft, service},
            CreateQuotation,
        },
        domain::{invoice, quotation, Invoice, Quotation},
        infra::{database::constraint, Database as _, Memory},
        query::NextInvoiceNumber,
        Command as _, Service,
    };

    use super::{store, ConvertQuotation, ExecutionError};

    async fn stored(
        svc: &Service<Memory>,
        id: quotation::Id,
    ) -> (Quotation, Option<Invoice>) {
        let db = svc.database();
        let q = db
            .execute(Select(By::<Option<Quotation>, _>::new(id)))
            .await
            .unwrap()
            .unwrap();
        let i = db
            .execute(Select(By::<Option<Invoice>, _>::new(id)))
            .await
            .unwrap();
        (q, i)
    }

    #[tokio::test]
    async fn converts_into_draft_invoice() {
        let svc = service();
        let mut draft = quotation_draft(&[
            ("Website Development", 1, 3500),
            ("Hosting", 12, 125),
        ]);
        draft.discount = Percent::whole(10);
        let q = svc.execute(CreateQuotation { draft }).await.unwrap();

        let c = svc
            .execute(ConvertQuotation { quotation_id: q.id })
            .await
            .unwrap();

        let today = Date::today();
        assert_eq!(c.invoice.number.to_string(), number("MZK", 1));
        assert_eq!(c.invoice.amount.amount, 4500.into());
        assert_eq!(c.invoice.quotation_id, Some(q.id));
        assert_eq!(c.invoice.status, invoice::Status::Draft);
        assert_eq!(c.invoice.date, today.coerce());
        assert_eq!(
            AsRef::<str>::as_ref(&c.invoice.description),
            "Website Development (1x R3500)\nHosting (12x R125)",
        );
        assert_eq!(c.quotation.status, quotation::Status::Accepted);
        assert_eq!(c.quotation.invoice_id, Some(c.invoice.id));
    }

    #[tokio::test]
    async fn refuses_converting_twice() {
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

        let err = svc
            .execute(ConvertQuotation { quotation_id: q.id })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::AlreadyConverted(id) if *id == c.invoice.id,
        ));
    }

    #[tokio::test]
    async fn reports_missing_invoice() {
        let svc = service();
        let mut q = svc
            .execute(CreateQuotation {
                draft: quotation_draft(&[("Hosting", 12, 125)]),
            })
            .await
            .unwrap();
        q.invoice_id = Some(invoice::Id::new());
        svc.database().execute(Update(q.clone())).await.unwrap();

        let err = svc
            .execute(ConvertQuotation { quotation_id: q.id })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::IncompleteConversion {
                missing: quotation::Half::Invoice,
            },
        ));
    }

    #[tokio::test]
    async fn reports_unknown_quotation() {
        let svc = service();
        let id = quotation::Id::new();

        let err = svc
            .execute(ConvertQuotation { quotation_id: id })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::QuotationNotExists(i) if *i == id,
        ));
    }

    #[tokio::test]
    async fn stores_nothing_once_numbering_attempts_exhausted() {
        let svc = service();
        let first = svc
            .execute(CreateQuotation {
                draft: quotation_draft(&[("Hosting", 12, 125)]),
            })
            .await
            .unwrap();
        let second = svc
            .execute(CreateQuotation {
                draft: quotation_draft(&[("Design", 1, 900)]),
            })
            .await
            .unwrap();
        _ = svc
            .execute(ConvertQuotation {
                quotation_id: first.id,
            })
            .await
            .unwrap();

        svc.database().stale_number_reads(2);
        let err = svc
            .execute(ConvertQuotation {
                quotation_id: second.id,
            })
            .await
            .unwrap_err();

        let ExecutionError::NumberingConflict(c) = err.as_ref() else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(c.attempted.to_string(), number("MZK", 1));
        assert_eq!(c.suggested.to_string(), number("MZK", 2));

        let (q, i) = stored(&svc, second.id).await;
        assert_eq!(q.status, quotation::Status::Draft);
        assert_eq!(q.invoice_id, None);
        assert_eq!(i, None);

        let c = svc
            .execute(ConvertQuotation {
                quotation_id: second.id,
            })
            .await
            .unwrap();
        assert_eq!(c.invoice.number.to_string(), number("MZK", 2));
    }

    #[tokio::test]
    async fn rolls_back_invoice_when_marking_fails() {
        let svc = service();
        let taken = svc
            .execute(CreateQuotation {
                draft: quotation_draft(&[("Hosting", 12, 125)]),
            })
            .await
            .unwrap();
        let q = svc
            .execute(CreateQuotation {
                draft: quotation_draft(&[("Design", 1, 900)]),
            })
            .await
            .unwrap();

        let config = svc.config();
        let mut conversion = q
            .convert(
                &config.numbering.invoice_prefix,
                iter::empty::<&str>(),
                Date::today(),
                config.terms.payment_term,
            )
            .unwrap();
        conversion.quotation.number = taken.number.clone();

        let err = store(svc.database(), conversion).await.unwrap_err();

        assert!(err
            .as_ref()
            .is_unique_violation(Some(constraint::QUOTATION_NUMBER)));
        let (stored_q, i) = stored(&svc, q.id).await;
        assert_eq!(stored_q, q);
        assert_eq!(i, None);
        assert_eq!(
            svc.execute(NextInvoiceNumber).await.unwrap().to_string(),
            number("MZK", 1),
        );
    }
}
