//! Postgres [`Database`] implementation, storing quotations and invoices.

pub mod client;
pub mod connection;
mod impls;

use deadpool_postgres::Runtime;
use derive_more::{Deref, Display, Error as StdError, From};
use refinery::{Report, Runner};
use tokio_postgres::{error::SqlState, NoTls};
use tracerr::Traced;
use tracing as log;

use crate::infra::database;
#[cfg(doc)]
use crate::infra::Database;

pub use refinery::embed_migrations;

pub use self::{
    client::{NonTx, Tx},
    connection::Connection,
};

pub use deadpool_postgres::Config;

/// Postgres [`Database`] client.
#[derive(Clone, Debug, Deref)]
pub struct Postgres<T = NonTx>(T);

impl Postgres {
    /// Creates a new [`Postgres`] client with the provided [`Config`].
    ///
    /// No connection is established until the first statement.
    ///
    /// # Errors
    ///
    /// If the [`Config`] doesn't describe a valid [`connection::Pool`].
    pub fn new(conf: &Config) -> Result<Self, Traced<database::Error>> {
        let pool = conf
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;
        Ok(Self(NonTx::from_pool(pool)))
    }

    /// Applies the schema migrations of the provided [`Runner`] missing in
    /// the database.
    ///
    /// # Errors
    ///
    /// If no connection can be checked out, or any migration fails.
    pub async fn migrate(
        &self,
        migrations: Runner,
    ) -> Result<Report, Traced<database::Error>> {
        let mut conn = self.0.checkout().await.map_err(tracerr::wrap!())?;
        let report = migrations
            .run_async(&mut **conn)
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;
        for m in report.applied_migrations() {
            log::info!(migration = %m, "applied schema migration");
        }
        Ok(report)
    }
}

/// Postgres database [`Error`].
#[derive(Debug, Display, StdError, From)]
pub enum Error {
    /// Statement failed on a [`Connection`].
    #[display("`Connection` error: {_0}")]
    #[from]
    Connection(connection::Error),

    /// [`Config`] doesn't describe a valid [`connection::Pool`].
    #[display("Failed to create a new `connection::Pool`: {_0}")]
    #[from]
    PoolCreationError(connection::PoolCreationError),

    /// No connection could be checked out of the [`connection::Pool`].
    #[display("`connection::Pool` error: {_0}")]
    #[from]
    PoolError(connection::PoolError),

    /// Schema migration failed.
    #[display("Schema migration failed: {_0}")]
    #[from]
    Migration(refinery::Error),

    /// Statement was issued through a committed [`Tx`].
    #[display("Transaction is committed already")]
    Committed,
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            Self::Connection(e) => {
                e.code() == Some(&SqlState::UNIQUE_VIOLATION)
                    && constraint.map_or(true, |c| {
                        e.as_db_error().and_then(|e| e.constraint()) == Some(c)
                    })
            }
            Self::Committed
            | Self::Migration(..)
            | Self::PoolError(..)
            | Self::PoolCreationError(..) => false,
        }
    }
}
