//! [`Command`] for creating a new [`Invoice`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{document::Scope, invoice, Invoice},
    infra::{database, database::constraint, Database},
    read, Service,
};

use super::{insert, store_numbered, Command, NumberingConflict};

/// [`Command`] for creating a new [`Invoice`].
///
/// A [`Draft`] without a [`Number`] is numbered automatically in the invoice
/// [`Scope`] of the current year.
///
/// [`Draft`]: invoice::Draft
/// [`Number`]: invoice::Number
#[derive(Clone, Debug)]
pub struct CreateInvoice {
    /// [`invoice::Draft`] of a new [`Invoice`].
    pub draft: invoice::Draft,
}

impl<Db> Command<CreateInvoice> for Service<Db>
where
    Db: Database<
            Select<By<read::invoice::Numbers, Scope>>,
            Ok = read::invoice::Numbers,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Invoice>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Invoice;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateInvoice) -> Result<Self::Ok, Self::Err> {
        let CreateInvoice { draft } = cmd;

        let numbering = &self.config().numbering;
        let scope = Scope {
            prefix: numbering.invoice_prefix.clone(),
            year: Date::today().year(),
        };
        let db = self.database();
        store_numbered(
            db,
            scope,
            draft.number.clone(),
            numbering.max_attempts,
            constraint::INVOICE_NUMBER,
            move |number| {
                let invoice = draft.clone().into_invoice(number);
                async move {
                    insert(db, invoice.clone())
                        .await
                        .map_err(tracerr::wrap!())
                        .map(|()| invoice)
                }
            },
        )
        .await
    }
}

/// Error of [`CreateInvoice`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`invoice::Number`] is already taken.
    #[display("{_0}")]
    NumberingConflict(NumberingConflict),
}

#[cfg(test)]
mod spec {
    use common::{Currency, Date, Money};

    use crate::{
        command::spec::{number, service},
        domain::{client, invoice},
        Command as _,
    };

    use super::{CreateInvoice, ExecutionError};

    fn draft(status: invoice::Status) -> invoice::Draft {
        let today = Date::today();
        invoice::Draft {
            number: None,
            client_id: client::Id::new(),
            project_id: None,
            amount: Money {
                amount: 1500.into(),
                currency: Currency::Zar,
            },
            date: today.coerce(),
            due_date: today.coerce(),
            status,
            description: invoice::Description::new("Website redesign")
                .unwrap(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn numbers_sequentially() {
        let svc = service();

        let first = svc
            .execute(CreateInvoice {
                draft: draft(invoice::Status::Draft),
            })
            .await
            .unwrap();
        let second = svc
            .execute(CreateInvoice {
                draft: draft(invoice::Status::Paid),
            })
            .await
            .unwrap();

        assert_eq!(first.number.to_string(), number("MZK", 1));
        assert_eq!(first.paid_date, None);
        assert_eq!(second.number.to_string(), number("MZK", 2));
        assert_eq!(second.paid_date, Some(Date::today().coerce()));
    }

    #[tokio::test]
    async fn keeps_manual_number_out_of_sequence() {
        let svc = service();
        let mut manual = draft(invoice::Status::Draft);
        manual.number = Some(number("MZK", 41).parse().unwrap());

        _ = svc.execute(CreateInvoice { draft: manual.clone() }).await.unwrap();
        let next = svc
            .execute(CreateInvoice {
                draft: draft(invoice::Status::Draft),
            })
            .await
            .unwrap();
        let err = svc
            .execute(CreateInvoice { draft: manual })
            .await
            .unwrap_err();

        assert_eq!(next.number.to_string(), number("MZK", 42));
        let ExecutionError::NumberingConflict(c) = err.as_ref() else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(c.suggested.to_string(), number("MZK", 43));
    }
}
