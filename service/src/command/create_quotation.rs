//! [`Command`] for creating a new [`Quotation`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{document::Scope, quotation, InvalidArgument, Quotation, Totals},
    infra::{database, database::constraint, Database},
    read, Service,
};

use super::{insert, store_numbered, Command, NumberingConflict};

/// [`Command`] for creating a new [`Quotation`].
///
/// A [`Draft`] without a [`Number`] is numbered automatically in the
/// quotation [`Scope`] of the current year.
///
/// [`Draft`]: quotation::Draft
/// [`Number`]: quotation::Number
#[derive(Clone, Debug)]
pub struct CreateQuotation {
    /// [`quotation::Draft`] of a new [`Quotation`].
    pub draft: quotation::Draft,
}

impl<Db> Command<CreateQuotation> for Service<Db>
where
    Db: Database<
            Select<By<read::quotation::Numbers, Scope>>,
            Ok = read::quotation::Numbers,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Quotation>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Quotation;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateQuotation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateQuotation { draft } = cmd;

        _ = Totals::compute(&draft.items, draft.discount, draft.currency)
            .map_err(|e| tracerr::new!(E::InvalidArgument(e)))?;

        let numbering = &self.config().numbering;
        let scope = Scope {
            prefix: numbering.quotation_prefix.clone(),
            year: Date::today().year(),
        };
        let db = self.database();
        store_numbered(
            db,
            scope,
            draft.number.clone(),
            numbering.max_attempts,
            constraint::QUOTATION_NUMBER,
            move |number| {
                let quotation = draft.clone().into_quotation(number);
                async move {
                    insert(db, quotation.clone())
                        .await
                        .map_err(tracerr::wrap!())
                        .map(|()| quotation)
                }
            },
        )
        .await
    }
}

/// Error of [`CreateQuotation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Quotation`] items cannot be totalled.
    #[display("Invalid `Quotation`: {_0}")]
    InvalidArgument(InvalidArgument),

    /// [`quotation::Number`] is already taken.
    #[display("{_0}")]
    #[from]
    NumberingConflict(NumberingConflict),
}

#[cfg(test)]
mod spec {
    use common::{Currency, Money};

    use crate::{
        command::spec::{number, quotation_draft, service},
        domain::{quotation, LineItem},
        Command as _,
    };

    use super::{CreateQuotation, ExecutionError};

    #[tokio::test]
    async fn numbers_sequentially() {
        let svc = service();

        for seq in 1..=3 {
            let q = svc
                .execute(CreateQuotation {
                    draft: quotation_draft(&[("Website Development", 1, 900)]),
                })
                .await
                .unwrap();
            assert_eq!(q.number.to_string(), number("QUO", seq));
            assert_eq!(q.status, quotation::Status::Draft);
            assert_eq!(q.invoice_id, None);
        }
    }

    #[tokio::test]
    async fn retries_lost_numbering_race() {
        let svc = service();
        _ = svc
            .execute(CreateQuotation {
                draft: quotation_draft(&[("Hosting", 12, 125)]),
            })
            .await
            .unwrap();

        svc.database().stale_number_reads(1);
        let q = svc
            .execute(CreateQuotation {
                draft: quotation_draft(&[("Hosting", 12, 125)]),
            })
            .await
            .unwrap();

        assert_eq!(q.number.to_string(), number("QUO", 2));
    }

    #[tokio::test]
    async fn reports_conflict_once_attempts_exhausted() {
        let svc = service();
        _ = svc
            .execute(CreateQuotation {
                draft: quotation_draft(&[("Hosting", 12, 125)]),
            })
            .await
            .unwrap();

        svc.database().stale_number_reads(2);
        let err = svc
            .execute(CreateQuotation {
                draft: quotation_draft(&[("Hosting", 12, 125)]),
            })
            .await
            .unwrap_err();

        let ExecutionError::NumberingConflict(c) = err.as_ref() else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(c.attempted.to_string(), number("QUO", 1));
        assert_eq!(c.suggested.to_string(), number("QUO", 2));
    }

    #[tokio::test]
    async fn reports_taken_manual_number() {
        let svc = service();
        let mut draft = quotation_draft(&[("Hosting", 12, 125)]);
        draft.number = Some("QUO-2024-007".parse().unwrap());
        _ = svc
            .execute(CreateQuotation {
                draft: draft.clone(),
            })
            .await
            .unwrap();

        let err = svc
            .execute(CreateQuotation { draft })
            .await
            .unwrap_err();

        let ExecutionError::NumberingConflict(c) = err.as_ref() else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(c.scope.to_string(), "QUO-2024");
        assert_eq!(c.suggested.to_string(), "QUO-2024-008");
    }

    #[tokio::test]
    async fn refuses_mixed_currencies() {
        let svc = service();
        let mut draft = quotation_draft(&[("Hosting", 12, 125)]);
        draft.items.push(
            LineItem::new(
                "CDN".parse().unwrap(),
                1.into(),
                Money {
                    amount: 10.into(),
                    currency: Currency::Usd,
                },
            )
            .unwrap(),
        );

        let err = svc.execute(CreateQuotation { draft }).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::InvalidArgument(_)));
    }
}
