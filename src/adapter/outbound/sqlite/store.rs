//! SQLite store implementation.
//!
//! One [`SqliteStore`] implements every store port; the impls are split by
//! concern into the submodules below.

mod addon;
mod group;
mod node;
mod schema;
mod user;

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use diesel::connection::{AnsiTransactionManager, TransactionManager};
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::SqliteConnection;
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::adapter::outbound::sqlite::database::connection::DbPool;
use crate::error::{Error, Result};
use crate::port::outbound::store::Transactional;

type Conn = SqliteConnection;
type Pooled = PooledConnection<ConnectionManager<SqliteConnection>>;

/// One connection with an open transaction, shared by every handle that
/// joined it. Rolled back on drop unless committed.
struct Transaction {
    conn: Mutex<Option<Pooled>>,
}

impl Transaction {
    fn open(mut conn: Pooled) -> Result<Self> {
        <AnsiTransactionManager as TransactionManager<Conn>>::begin_transaction(&mut *conn)?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    fn commit(&self) -> Result<()> {
        let mut slot = self.conn.lock();
        let mut conn = slot
            .take()
            .ok_or_else(|| Error::Connection("transaction already finished".into()))?;
        <AnsiTransactionManager as TransactionManager<Conn>>::commit_transaction(&mut *conn)?;
        Ok(())
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if let Some(mut conn) = self.conn.get_mut().take() {
            if let Err(e) = <AnsiTransactionManager as TransactionManager<Conn>>::rollback_transaction(&mut *conn) {
                warn!(error = %e, "Transaction rollback failed");
            } else {
                debug!("Transaction rolled back");
            }
        }
    }
}

/// A connection for one store call: a fresh one from the pool, or the
/// connection of the transaction the store is bound to.
enum ConnGuard<'a> {
    Pooled(Pooled),
    Shared(MappedMutexGuard<'a, Pooled>),
}

impl Deref for ConnGuard<'_> {
    type Target = Conn;

    fn deref(&self) -> &Conn {
        match self {
            Self::Pooled(conn) => conn,
            Self::Shared(conn) => conn,
        }
    }
}

impl DerefMut for ConnGuard<'_> {
    fn deref_mut(&mut self) -> &mut Conn {
        match self {
            Self::Pooled(conn) => conn,
            Self::Shared(conn) => conn,
        }
    }
}

/// SQLite-backed store for every persisted entity.
#[derive(Clone)]
pub struct SqliteStore {
    /// Database connection pool.
    pool: DbPool,
    /// Set on handles returned by [`Transactional::begin`].
    tx: Option<Arc<Transaction>>,
    /// Whether this handle opened `tx` (and so commits it).
    owns_tx: bool,
}

impl SqliteStore {
    /// Create a new SQLite store with the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            tx: None,
            owns_tx: false,
        }
    }

    #[must_use]
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    fn conn(&self) -> Result<ConnGuard<'_>> {
        match &self.tx {
            None => Ok(ConnGuard::Pooled(self.pool.get()?)),
            Some(tx) => MutexGuard::try_map(tx.conn.lock(), Option::as_mut)
                .map(ConnGuard::Shared)
                .map_err(|_| Error::Connection("transaction already finished".into())),
        }
    }
}

impl Transactional for SqliteStore {
    async fn begin(&self) -> Result<Self> {
        if let Some(tx) = &self.tx {
            return Ok(Self {
                pool: self.pool.clone(),
                tx: Some(Arc::clone(tx)),
                owns_tx: false,
            });
        }
        let tx = Transaction::open(self.pool.get()?)?;
        Ok(Self {
            pool: self.pool.clone(),
            tx: Some(Arc::new(tx)),
            owns_tx: true,
        })
    }

    async fn commit(&self) -> Result<()> {
        match &self.tx {
            Some(tx) if self.owns_tx => tx.commit(),
            _ => Ok(()),
        }
    }
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339()
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .map_err(|e| Error::Parse(format!("timestamp {raw:?}: {e}")))?
        .with_timezone(&Utc))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| Error::Parse(e.to_string()))
}

fn from_json<T: DeserializeOwned>(raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|e| Error::Parse(e.to_string()))
}
