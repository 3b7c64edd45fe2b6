//! Clients the [`Postgres`] document store is operated through.
//!
//! [`Postgres`]: super::Postgres

use std::{mem, sync::Arc};

use tokio::sync::{RwLock, RwLockReadGuard};
use tokio_postgres::Row;
use tracerr::Traced;
use tracing as log;

use crate::infra::database::{
    self,
    postgres::{
        self,
        connection::{self, Params},
        Connection,
    },
};

/// Non-transactional client, running every statement on its own connection
/// checked out of the [`connection::Pool`].
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`connection::Pool`] the connections are checked out of.
    pub(crate) pool: connection::Pool,
}

impl NonTx {
    /// Creates a new [`NonTx`] client over the provided [`connection::Pool`].
    #[must_use]
    pub(crate) const fn from_pool(pool: connection::Pool) -> Self {
        Self { pool }
    }

    /// Checks out a [`connection::Pooled`] connection.
    pub(crate) async fn checkout(
        &self,
    ) -> Result<connection::Pooled, Traced<database::Error>> {
        self.pool
            .get()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

impl Connection for NonTx {
    async fn query(
        &self,
        sql: &str,
        params: &Params<'_>,
    ) -> Result<Vec<Row>, Traced<database::Error>> {
        let conn = self.checkout().await.map_err(tracerr::wrap!())?;
        conn.query(sql, params).await.map_err(tracerr::wrap!())
    }

    async fn query_opt(
        &self,
        sql: &str,
        params: &Params<'_>,
    ) -> Result<Option<Row>, Traced<database::Error>> {
        let conn = self.checkout().await.map_err(tracerr::wrap!())?;
        conn.query_opt(sql, params).await.map_err(tracerr::wrap!())
    }

    async fn exec(
        &self,
        sql: &str,
        params: &Params<'_>,
    ) -> Result<u64, Traced<database::Error>> {
        let conn = self.checkout().await.map_err(tracerr::wrap!())?;
        conn.exec(sql, params).await.map_err(tracerr::wrap!())
    }
}

/// Transactional client, shared by all the writes of a single command.
///
/// The transaction is begun lazily on the first statement, so a [`Tx`] never
/// used holds no connection.
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`connection::Pool`] to check the transaction connection out of.
    pool: connection::Pool,

    /// [`State`] of the transaction.
    state: Arc<RwLock<State>>,
}

/// State of a [`Tx`] client transaction.
#[derive(Debug, Default)]
enum State {
    /// No statement has run yet.
    #[default]
    Idle,

    /// Transaction is open on the contained [`connection::Tx`].
    Begun(connection::Tx),

    /// Transaction is committed, so no more statements may run.
    Committed,
}

impl State {
    /// Returns the open [`connection::Tx`], if any.
    const fn begun(&self) -> Option<&connection::Tx> {
        match self {
            Self::Begun(tx) => Some(tx),
            Self::Idle | Self::Committed => None,
        }
    }
}

impl Tx {
    /// Creates a new [`Tx`] client out of the provided [`NonTx`] one.
    #[must_use]
    pub fn from_non_tx(client: &NonTx) -> Self {
        Self {
            pool: client.pool.clone(),
            state: Arc::default(),
        }
    }

    /// Returns the [`connection::Tx`] of this [`Tx`] client, beginning the
    /// transaction if it's not begun yet.
    async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::Tx>, Traced<database::Error>>
    {
        let state = self.state.read().await;
        let state = match RwLockReadGuard::try_map(state, State::begun) {
            Ok(tx) => return Ok(tx),
            Err(state) => state,
        };
        if matches!(*state, State::Committed) {
            return Err(committed());
        }
        drop(state);

        let mut state = self.state.write().await;
        match *state {
            State::Idle => {
                let pooled = self
                    .pool
                    .get()
                    .await
                    .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                    .map_err(tracerr::map_from)?;
                *state = State::Begun(
                    connection::Tx::begin(pooled)
                        .await
                        .map_err(tracerr::wrap!())?,
                );
                log::debug!("transaction begun");
            }
            State::Begun(_) => {}
            State::Committed => return Err(committed()),
        }
        RwLockReadGuard::try_map(state.downgrade(), State::begun)
            .map_err(|_| committed())
    }

    /// Commits the transaction of this [`Tx`] client.
    ///
    /// Committing a [`Tx`] client no statement has run on is a no-op.
    ///
    /// # Errors
    ///
    /// If the transaction fails to commit, or is committed already.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let state =
            mem::replace(&mut *self.state.write().await, State::Committed);
        match state {
            State::Begun(tx) => {
                tx.commit().await.map_err(tracerr::wrap!())?;
                log::debug!("transaction committed");
                Ok(())
            }
            State::Idle => Ok(()),
            State::Committed => Err(committed()),
        }
    }
}

impl Connection for Tx {
    async fn query(
        &self,
        sql: &str,
        params: &Params<'_>,
    ) -> Result<Vec<Row>, Traced<database::Error>> {
        self.connection()
            .await
            .map_err(tracerr::wrap!())?
            .query(sql, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn query_opt(
        &self,
        sql: &str,
        params: &Params<'_>,
    ) -> Result<Option<Row>, Traced<database::Error>> {
        self.connection()
            .await
            .map_err(tracerr::wrap!())?
            .query_opt(sql, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn exec(
        &self,
        sql: &str,
        params: &Params<'_>,
    ) -> Result<u64, Traced<database::Error>> {
        self.connection()
            .await
            .map_err(tracerr::wrap!())?
            .exec(sql, params)
            .await
            .map_err(tracerr::wrap!())
    }
}

/// Creates a [`postgres::Error::Committed`] error.
fn committed() -> Traced<database::Error> {
    tracerr::new!(database::Error::from(postgres::Error::Committed))
}
