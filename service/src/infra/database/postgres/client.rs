//! Postgres database clients lazily checking connections out of a
//! [`connection::Pool`].

use std::{future::Future, sync::Arc};

use tokio::sync::{RwLock, RwLockReadGuard};
use tokio_postgres::{Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{
        self,
        connection::{self, Params},
        Connection,
    },
};

/// Slot holding a connection once it's needed for the first time.
#[derive(Debug)]
struct Slot<C>(RwLock<Option<C>>);

impl<C> Default for Slot<C> {
    fn default() -> Self {
        Self(RwLock::new(None))
    }
}

impl<C> Slot<C> {
    /// Returns the held connection, filling this [`Slot`] with the one
    /// produced by `init` if it's empty.
    async fn get_or_try_init<F, Fut>(
        &self,
        init: F,
    ) -> Result<RwLockReadGuard<'_, C>, Traced<database::Error>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<C, Traced<database::Error>>>,
    {
        let held = self.0.read().await;
        let held = if held.is_some() {
            held
        } else {
            drop(held);

            let mut held = self.0.write().await;
            if held.is_none() {
                *held = Some(init().await.map_err(tracerr::wrap!())?);
            }
            held.downgrade()
        };

        Ok(RwLockReadGuard::map(held, |c| {
            c.as_ref().expect("`Slot` is filled while guarded")
        }))
    }

    /// Empties this [`Slot`], returning the connection it held.
    async fn take(&self) -> Option<C> {
        self.0.write().await.take()
    }
}

/// Checks a new connection out of the `pool`.
pub(crate) async fn checkout(
    pool: &connection::Pool,
) -> Result<connection::Pooled, Traced<database::Error>> {
    pool.get()
        .await
        .map_err(tracerr::from_and_wrap!(=> postgres::Error))
        .map_err(tracerr::map_from)
}

/// Client running every statement on its own.
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`connection::Pool`] the connection is checked out of.
    pub(crate) pool: connection::Pool,

    /// Connection checked out on the first statement.
    slot: Arc<Slot<connection::Pooled>>,
}

impl NonTx {
    /// Creates a new [`NonTx`] client over the provided [`connection::Pool`].
    #[must_use]
    pub(crate) fn from_pool(pool: connection::Pool) -> Self {
        Self {
            pool,
            slot: Arc::default(),
        }
    }

    /// Returns the connection of this [`NonTx`] client, checking one out if
    /// there is none yet.
    async fn connection(
        &self,
    ) -> Result<
        RwLockReadGuard<'_, connection::Pooled>,
        Traced<database::Error>,
    > {
        self.slot.get_or_try_init(|| checkout(&self.pool)).await
    }
}

/// Client running every statement in a single transaction, opened on the
/// first statement.
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`connection::Pool`] to check a connection out of, if the [`NonTx`]
    /// client hasn't one.
    pool: connection::Pool,

    /// [`NonTx`] client whose connection the transaction is opened on.
    origin: Arc<Slot<NonTx>>,

    /// Transaction opened on the first statement.
    slot: Arc<Slot<connection::Transaction>>,
}

impl Tx {
    /// Creates a new [`Tx`] client reusing the connection of the provided
    /// [`NonTx`] client.
    #[must_use]
    pub fn from_non_tx(client: NonTx) -> Self {
        Self {
            pool: client.pool.clone(),
            origin: Arc::new(Slot(RwLock::new(Some(client)))),
            slot: Arc::default(),
        }
    }

    /// Returns the transaction of this [`Tx`] client, opening one if there
    /// is none yet.
    async fn connection(
        &self,
    ) -> Result<
        RwLockReadGuard<'_, connection::Transaction>,
        Traced<database::Error>,
    > {
        self.slot
            .get_or_try_init(|| async {
                let reused = match self.origin.take().await {
                    Some(client) => client.slot.take().await,
                    None => None,
                };
                let pooled = match reused {
                    Some(pooled) => pooled,
                    None => checkout(&self.pool).await?,
                };
                connection::Transaction::begin(pooled).await
            })
            .await
    }

    /// Commits the transaction of this [`Tx`] client, if any was opened.
    ///
    /// The next statement opens a new transaction.
    ///
    /// # Errors
    ///
    /// If the database fails to commit.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        match self.slot.take().await {
            Some(tx) => tx.commit().await.map_err(tracerr::wrap!()),
            None => Ok(()),
        }
    }
}

/// Implements [`Connection`] for the `$client` by delegating to its lazily
/// initialized connection.
macro_rules! delegate_connection {
    ($client:ty) => {
        impl Connection for $client {
            async fn query<T>(
                &self,
                stmt: &T,
                params: &Params<'_>,
            ) -> Result<Vec<Row>, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(tracerr::wrap!())?
                    .query(stmt, params)
                    .await
                    .map_err(tracerr::wrap!())
            }

            async fn query_opt<T>(
                &self,
                stmt: &T,
                params: &Params<'_>,
            ) -> Result<Option<Row>, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(tracerr::wrap!())?
                    .query_opt(stmt, params)
                    .await
                    .map_err(tracerr::wrap!())
            }

            async fn exec<T>(
                &self,
                stmt: &T,
                params: &Params<'_>,
            ) -> Result<u64, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(tracerr::wrap!())?
                    .exec(stmt, params)
                    .await
                    .map_err(tracerr::wrap!())
            }

            async fn batch_exec(
                &self,
                sql: &str,
            ) -> Result<(), Traced<database::Error>> {
                self.connection()
                    .await
                    .map_err(tracerr::wrap!())?
                    .batch_exec(sql)
                    .await
                    .map_err(tracerr::wrap!())
            }
        }
    };
}

delegate_connection!(NonTx);
delegate_connection!(Tx);

#[cfg(test)]
mod spec {
    use tracerr::Traced;

    use crate::infra::database;

    use super::Slot;

    #[tokio::test]
    async fn fills_slot_only_once() {
        let slot = Slot::<u32>::default();

        let first = *slot
            .get_or_try_init(|| async { Ok::<_, Traced<database::Error>>(1) })
            .await
            .unwrap();
        let second = *slot
            .get_or_try_init(|| async { Ok(2) })
            .await
            .unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 1);
    }

    #[tokio::test]
    async fn refills_slot_after_take() {
        let slot = Slot::<u32>::default();
        drop(slot.get_or_try_init(|| async { Ok(1) }).await.unwrap());

        assert_eq!(slot.take().await, Some(1));
        assert_eq!(slot.take().await, None);

        let refilled = *slot
            .get_or_try_init(|| async { Ok(3) })
            .await
            .unwrap();
        assert_eq!(refilled, 3);
    }
}
