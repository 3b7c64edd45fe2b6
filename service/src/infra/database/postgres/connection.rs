//! Raw [`Connection`]s the document store talks to Postgres over.

use std::{fmt, future::Future};

use futures::{FutureExt as _, TryFutureExt as _};
use ouroboros::self_referencing;
use tokio_postgres::{types::ToSql, Row};
use tracerr::Traced;
use tracing as log;

use crate::infra::database::{self, postgres};

pub use deadpool_postgres::{
    Client as Pooled, CreatePoolError as PoolCreationError, Pool, PoolError,
};
pub use tokio_postgres::Error;

/// Parameters of a SQL statement.
pub type Params<'p> = [&'p (dyn ToSql + Sync)];

/// Postgres [`Connection`] with an open transaction, owning the [`Pooled`]
/// connection it was begun on.
#[self_referencing]
pub struct Tx {
    /// [`Pooled`] connection the transaction is open on.
    pooled: Pooled,

    /// Open transaction, [`None`] once committed.
    #[borrows(mut pooled)]
    #[not_covariant]
    tx: Option<deadpool_postgres::Transaction<'this>>,
}

impl fmt::Debug for Tx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tx")
            .field("open", &self.with_tx(|tx| tx.is_some()))
            .finish_non_exhaustive()
    }
}

impl Tx {
    /// Begins a new [`Tx`] on the provided [`Pooled`] connection.
    ///
    /// # Errors
    ///
    /// If Postgres refuses to begin the transaction.
    pub async fn begin(
        pooled: Pooled,
    ) -> Result<Self, Traced<database::Error>> {
        Self::try_new_async_send(pooled, |c| {
            c.transaction().map_ok(Some).boxed()
        })
        .await
        .map_err(failed)
    }

    /// Commits this [`Tx`], releasing its [`Pooled`] connection.
    ///
    /// # Errors
    ///
    /// If Postgres fails to commit the transaction, in which case nothing
    /// written through this [`Tx`] is stored.
    pub async fn commit(mut self) -> Result<(), Traced<database::Error>> {
        #[expect(
            clippy::redundant_closure_for_method_calls,
            reason = "different variance, see \
                      https://doc.rust-lang.org/nomicon/subtyping.html#variance"
        )]
        let Some(tx) = self.with_tx_mut(|tx| tx.take()) else {
            return Ok(());
        };
        tx.commit().await.map_err(failed)
    }

    /// Runs the provided `op` over the open transaction of this [`Tx`].
    async fn with_open<'s, T, F, Fut>(
        &'s self,
        op: F,
    ) -> Result<T, Traced<database::Error>>
    where
        F: FnOnce(&'s deadpool_postgres::Transaction<'s>) -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let Some(tx) = self.with_tx(|tx| tx.as_ref()) else {
            return Err(tracerr::new!(database::Error::from(
                postgres::Error::Committed
            )));
        };
        op(tx).await.map_err(failed)
    }
}

/// Postgres connection the document store runs its SQL statements over.
pub trait Connection {
    /// Runs the provided `sql` query and returns all the resulting [`Row`]s.
    ///
    /// # Errors
    ///
    /// If Postgres fails to run the query.
    fn query(
        &self,
        sql: &str,
        params: &Params<'_>,
    ) -> impl Future<Output = Result<Vec<Row>, Traced<database::Error>>>;

    /// Runs the provided `sql` query expecting at most one resulting [`Row`].
    ///
    /// # Errors
    ///
    /// If Postgres fails to run the query, or it returns multiple [`Row`]s.
    fn query_opt(
        &self,
        sql: &str,
        params: &Params<'_>,
    ) -> impl Future<Output = Result<Option<Row>, Traced<database::Error>>>;

    /// Runs the provided `sql` statement and returns the number of rows it
    /// affected.
    ///
    /// # Errors
    ///
    /// If Postgres fails to run the statement, like when it violates a
    /// uniqueness constraint of the stored documents.
    fn exec(
        &self,
        sql: &str,
        params: &Params<'_>,
    ) -> impl Future<Output = Result<u64, Traced<database::Error>>>;
}

impl Connection for Pooled {
    async fn query(
        &self,
        sql: &str,
        params: &Params<'_>,
    ) -> Result<Vec<Row>, Traced<database::Error>> {
        log::trace!(sql, "querying");
        (**self).query(sql, params).await.map_err(failed)
    }

    async fn query_opt(
        &self,
        sql: &str,
        params: &Params<'_>,
    ) -> Result<Option<Row>, Traced<database::Error>> {
        log::trace!(sql, "querying");
        (**self).query_opt(sql, params).await.map_err(failed)
    }

    async fn exec(
        &self,
        sql: &str,
        params: &Params<'_>,
    ) -> Result<u64, Traced<database::Error>> {
        log::trace!(sql, "executing");
        (**self).execute(sql, params).await.map_err(failed)
    }
}

impl Connection for Tx {
    async fn query(
        &self,
        sql: &str,
        params: &Params<'_>,
    ) -> Result<Vec<Row>, Traced<database::Error>> {
        log::trace!(sql, "querying in transaction");
        self.with_open(|tx| tx.query(sql, params)).await
    }

    async fn query_opt(
        &self,
        sql: &str,
        params: &Params<'_>,
    ) -> Result<Option<Row>, Traced<database::Error>> {
        log::trace!(sql, "querying in transaction");
        self.with_open(|tx| tx.query_opt(sql, params)).await
    }

    async fn exec(
        &self,
        sql: &str,
        params: &Params<'_>,
    ) -> Result<u64, Traced<database::Error>> {
        log::trace!(sql, "executing in transaction");
        self.with_open(|tx| tx.execute(sql, params)).await
    }
}

/// Wraps the provided Postgres [`Error`] into a [`database::Error`].
fn failed(e: Error) -> Traced<database::Error> {
    tracerr::new!(database::Error::from(postgres::Error::from(e)))
}
