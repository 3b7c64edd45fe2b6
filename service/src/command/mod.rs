//! [`Command`] definition.

pub mod complete_conversion;
pub mod convert_quotation;
pub mod create_invoice;
pub mod create_quotation;
pub mod update_invoice_status;
pub mod update_quotation;
pub mod update_quotation_status;

use std::{future::Future, ops::Deref};

use common::operations::{
    By, Commit, Insert, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::document::{Number, Scope},
    infra::{database, Database},
};

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    complete_conversion::CompleteConversion,
    convert_quotation::ConvertQuotation, create_invoice::CreateInvoice,
    create_quotation::CreateQuotation,
    update_invoice_status::UpdateInvoiceStatus,
    update_quotation::UpdateQuotation,
    update_quotation_status::UpdateQuotationStatus,
};

/// Document [`Number`] is already taken by a stored document.
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
#[display(
    "`{attempted}` number is already taken in `{scope}`, \
     `{suggested}` could be used instead"
)]
pub struct NumberingConflict {
    /// [`Number`] the document was attempted to be stored with.
    pub attempted: Number,

    /// [`Scope`] of the [`NumberingConflict::attempted`] [`Number`].
    pub scope: Scope,

    /// Next free [`Number`] in the [`Scope`] at the moment of the conflict.
    pub suggested: Number,
}

/// Stores a new document under a [`Number`] allocated in the provided
/// [`Scope`], or under the `manual` one, if any.
///
/// The document is built and stored by the provided `store` operation, which
/// fails with a unique violation of the `constraint` if the [`Number`] is
/// taken. An allocated [`Number`] is re-allocated over the freshly read
/// numbers of the [`Scope`], until `max_attempts` are made. A `manual`
/// [`Number`] is never re-allocated.
async fn store_numbered<Db, N, T, E, F, Fut>(
    db: &Db,
    scope: Scope,
    manual: Option<Number>,
    max_attempts: u8,
    constraint: &str,
    store: F,
) -> Result<T, Traced<E>>
where
    Db: Database<Select<By<N, Scope>>, Ok = N, Err = Traced<database::Error>>,
    N: Deref<Target = Vec<String>>,
    E: From<database::Error> + From<NumberingConflict>,
    F: Fn(Number) -> Fut,
    Fut: Future<Output = Result<T, Traced<database::Error>>>,
{
    let mut attempt = 1;
    loop {
        let number = if let Some(n) = &manual {
            n.clone()
        } else {
            let existing = db
                .execute(Select(By::new(scope.clone())))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            Number::allocate(scope.clone(), existing.iter())
        };
        log::debug!(%number, attempt, "storing document");

        let err = match store(number.clone()).await {
            Ok(doc) => return Ok(doc),
            Err(e) => e,
        };
        if !err.as_ref().is_unique_violation(Some(constraint)) {
            return Err(err).map_err(tracerr::map_from_and_wrap!(=> E));
        }

        if manual.is_none() && attempt < max_attempts {
            log::warn!(%number, attempt, "number is taken, re-allocating");
            attempt += 1;
            continue;
        }

        let scope = number.scope().clone();
        let existing = db
            .execute(Select(By::new(scope.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let suggested = Number::allocate(scope.clone(), existing.iter());
        log::warn!(%number, %suggested, attempt, "number is taken");

        return Err(tracerr::new!(E::from(NumberingConflict {
            attempted: number,
            scope,
            suggested,
        })));
    }
}

/// Inserts the provided document in a new transaction of the [`Database`].
async fn insert<Db, T>(db: &Db, doc: T) -> Result<(), Traced<database::Error>>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<T>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    let tx = db.execute(Transact).await.map_err(tracerr::wrap!())?;
    tx.execute(Insert(doc))
        .await
        .map_err(tracerr::wrap!())
        .map(drop)?;
    tx.execute(Commit)
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
}

/// Updates the provided document in a new transaction of the [`Database`].
async fn update<Db, T>(db: &Db, doc: T) -> Result<(), Traced<database::Error>>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Update<T>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    let tx = db.execute(Transact).await.map_err(tracerr::wrap!())?;
    tx.execute(Update(doc))
        .await
        .map_err(tracerr::wrap!())
        .map(drop)?;
    tx.execute(Commit)
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
}

#[cfg(test)]
pub(crate) mod spec {
    //! Shared fixtures of [`Command`] specs.
    //!
    //! [`Command`]: super::Command

    use std::time::Duration;

    use common::{Currency, Date, Money, Percent};

    use crate::{
        domain::{client, quotation, LineItem},
        infra::Memory,
        Config, Service,
    };

    pub(crate) fn service() -> Service<Memory> {
        Service::new(Config::default(), Memory::new())
    }

    pub(crate) fn quotation_draft(
        items: &[(&str, u32, u32)],
    ) -> quotation::Draft {
        let today = Date::today();
        quotation::Draft {
            number: None,
            client_id: client::Id::new(),
            project_id: None,
            date: today.coerce(),
            valid_until: (today + Duration::from_secs(30 * 24 * 60 * 60))
                .coerce(),
            currency: Currency::Zar,
            items: items
                .iter()
                .map(|(d, q, p)| {
                    LineItem::new(
                        d.parse().unwrap(),
                        (*q).into(),
                        Money {
                            amount: (*p).into(),
                            currency: Currency::Zar,
                        },
                    )
                    .unwrap()
                })
                .collect(),
            discount: Percent::ZERO,
            notes: None,
            terms: None,
        }
    }

    pub(crate) fn number(prefix: &str, sequence: u32) -> String {
        format!("{prefix}-{}-{sequence:03}", Date::today().year())
    }
}
