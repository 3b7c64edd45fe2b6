//! [`Database`] implementations of [`Postgres`].

#![allow(
    clippy::items_after_statements,
    reason = "`const SQL` after statements"
)]

mod invoice;
mod quotation;

use common::operations::{Commit, Transact};
use tracerr::Traced;

use crate::infra::{database, Database};

use super::{NonTx, Postgres, Tx};

/// Starts a new transaction to store a document in.
impl Database<Transact> for Postgres<NonTx> {
    type Ok = Postgres<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Postgres(Tx::from_non_tx(&self.0)))
    }
}

/// Joins the already started transaction.
impl Database<Transact> for Postgres<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Postgres<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        self.commit().await.map_err(tracerr::wrap!())
    }
}
