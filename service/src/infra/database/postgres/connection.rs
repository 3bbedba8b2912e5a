//! Raw Postgres [`Connection`]s checked out of a [`Pool`].

use std::{fmt, future::Future};

use futures::{FutureExt as _, TryFutureExt as _};
use ouroboros::self_referencing;
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{self, postgres};

pub use deadpool_postgres::{
    Client as Pooled, CreatePoolError as PoolCreationError, Pool, PoolError,
};
pub use tokio_postgres::Error;

/// Statement parameters accepted by a [`Connection`].
pub type Params<'p> = [&'p (dyn ToSql + Sync)];

/// Anything capable of running SQL statements against the database.
pub trait Connection {
    /// Runs the `stmt` and returns all the rows it produced.
    ///
    /// # Errors
    ///
    /// If the statement fails.
    fn query<T>(
        &self,
        stmt: &T,
        params: &Params<'_>,
    ) -> impl Future<Output = Result<Vec<Row>, Traced<database::Error>>>
    where
        T: ToStatement + ?Sized;

    /// Runs the `stmt` expecting at most one row back.
    ///
    /// # Errors
    ///
    /// If the statement fails or produces more than one row.
    fn query_opt<T>(
        &self,
        stmt: &T,
        params: &Params<'_>,
    ) -> impl Future<Output = Result<Option<Row>, Traced<database::Error>>>
    where
        T: ToStatement + ?Sized;

    /// Runs the `stmt` and returns how many rows it touched.
    ///
    /// # Errors
    ///
    /// If the statement fails.
    fn exec<T>(
        &self,
        stmt: &T,
        params: &Params<'_>,
    ) -> impl Future<Output = Result<u64, Traced<database::Error>>>
    where
        T: ToStatement + ?Sized;

    /// Runs several `;`-separated statements without parameters.
    ///
    /// # Errors
    ///
    /// If any of the statements fails.
    fn batch_exec(
        &self,
        sql: &str,
    ) -> impl Future<Output = Result<(), Traced<database::Error>>>;
}

/// Open transaction holding the [`Pooled`] connection it runs on.
#[self_referencing]
pub struct Transaction {
    /// Connection the transaction was opened on.
    pooled: Pooled,

    /// Transaction itself, [`None`] once committed.
    #[borrows(mut pooled)]
    #[not_covariant]
    open: Option<deadpool_postgres::Transaction<'this>>,
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("committed", &self.with_open(|open| open.is_none()))
            .finish_non_exhaustive()
    }
}

impl Transaction {
    /// Opens a new [`Transaction`] on the provided [`Pooled`] connection.
    ///
    /// # Errors
    ///
    /// If the database refuses to start a transaction.
    pub async fn begin(
        pooled: Pooled,
    ) -> Result<Self, Traced<database::Error>> {
        Self::try_new_async_send(pooled, |c| {
            c.transaction().map_ok(Some).boxed()
        })
        .await
        .map_err(tracerr::from_and_wrap!(=> postgres::Error))
        .map_err(tracerr::map_from)
    }

    /// Returns the open transaction.
    fn open(&self) -> &deadpool_postgres::Transaction<'_> {
        self.with_open(|open| {
            open.as_ref().expect("`Transaction` is used after commit")
        })
    }

    /// Commits this [`Transaction`].
    ///
    /// # Errors
    ///
    /// If the database fails to commit.
    #[expect(clippy::missing_panics_doc, reason = "consumed on commit")]
    pub async fn commit(mut self) -> Result<(), Traced<database::Error>> {
        #[expect(
            clippy::redundant_closure_for_method_calls,
            reason = "`Option::take` cannot be named due to invariance"
        )]
        self.with_open_mut(|open| open.take())
            .expect("`Transaction` is committed twice")
            .commit()
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

/// Returns the [`tokio_postgres::Client`] behind the [`Pooled`] connection.
fn pooled(conn: &Pooled) -> &tokio_postgres::Client {
    conn
}

/// Implements [`Connection`] for the `$conn` type by running statements on
/// whatever its `$raw` accessor returns.
macro_rules! impl_connection {
    ($conn:ty, $raw:path) => {
        impl Connection for $conn {
            async fn query<T>(
                &self,
                stmt: &T,
                params: &Params<'_>,
            ) -> Result<Vec<Row>, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                $raw(self)
                    .query(stmt, params)
                    .await
                    .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                    .map_err(tracerr::map_from)
            }

            async fn query_opt<T>(
                &self,
                stmt: &T,
                params: &Params<'_>,
            ) -> Result<Option<Row>, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                $raw(self)
                    .query_opt(stmt, params)
                    .await
                    .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                    .map_err(tracerr::map_from)
            }

            async fn exec<T>(
                &self,
                stmt: &T,
                params: &Params<'_>,
            ) -> Result<u64, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                $raw(self)
                    .execute(stmt, params)
                    .await
                    .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                    .map_err(tracerr::map_from)
            }

            async fn batch_exec(
                &self,
                sql: &str,
            ) -> Result<(), Traced<database::Error>> {
                $raw(self)
                    .batch_execute(sql)
                    .await
                    .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                    .map_err(tracerr::map_from)
            }
        }
    };
}

impl_connection!(Pooled, pooled);
impl_connection!(Transaction, Transaction::open);
