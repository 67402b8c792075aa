//! Store connection and per-scope sessions.
//!
//! A [`Db`] owns the connection pool. A [`Session`] is one logical
//! conversation with the store: writes made through it share one lazily
//! opened transaction until [`Session::commit`] or [`Session::rollback`].
//!
//! `Session` is a cheap handle; clones refer to the same session. Every
//! operation locks the session for its whole duration, so two operations on
//! one session never overlap even when issued from different tasks.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DatabaseTransaction, DbBackend,
    TransactionTrait,
};
use tokio::sync::{Mutex, MutexGuard};

use crate::config::DatabaseConfig;
use crate::error::DbError;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Pooled store connection.
#[derive(Clone, Debug)]
pub struct Db {
    conn: DatabaseConnection,
}

impl Db {
    /// Connect using `cfg`.
    ///
    /// # Errors
    /// Returns `DbError::Sea` if the pool cannot be created.
    pub async fn connect(cfg: &DatabaseConfig) -> Result<Self, DbError> {
        let mut opts = ConnectOptions::new(cfg.database_url());
        opts.max_connections(cfg.max_connections)
            .acquire_timeout(cfg.acquire_timeout())
            .sqlx_logging(cfg.sql_logging);
        if let Some(min) = cfg.min_connections {
            opts.min_connections(min);
        }

        let conn = Database::connect(opts).await?;
        let db = Self { conn };
        tracing::info!(engine = db.engine(), url = %cfg.redacted_url(), "database connected");
        Ok(db)
    }

    #[must_use]
    pub fn from_connection(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Raw connection for schema management.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Return database engine identifier for tracing / logging.
    #[must_use]
    pub fn engine(&self) -> &'static str {
        match self.conn.get_database_backend() {
            DbBackend::Postgres => "postgres",
            DbBackend::MySql => "mysql",
            DbBackend::Sqlite => "sqlite",
        }
    }

    /// Open a new session. No store I/O happens until the first statement.
    #[must_use]
    pub fn session(&self) -> Session {
        Session::new(self.conn.clone())
    }
}

/// Where a read statement runs.
pub(crate) enum Runner<'a> {
    Conn(&'a DatabaseConnection),
    Tx(&'a DatabaseTransaction),
}

pub(crate) struct SessionState {
    conn: DatabaseConnection,
    tx: Option<DatabaseTransaction>,
    closed: bool,
}

impl SessionState {
    pub(crate) fn ensure_open(&self) -> Result<(), DbError> {
        if self.closed {
            return Err(DbError::SessionClosed);
        }
        Ok(())
    }

    /// Runner for reads: the pending transaction if there is one, the pool otherwise.
    pub(crate) fn reader(&self) -> Result<Runner<'_>, DbError> {
        self.ensure_open()?;
        Ok(match &self.tx {
            Some(tx) => Runner::Tx(tx),
            None => Runner::Conn(&self.conn),
        })
    }

    /// Transaction for writes, opened on first use.
    pub(crate) async fn writer(&mut self) -> Result<&DatabaseTransaction, DbError> {
        self.ensure_open()?;
        let tx = match self.tx.take() {
            Some(tx) => tx,
            None => self.conn.begin().await?,
        };
        Ok(self.tx.insert(tx))
    }

    pub(crate) async fn commit(&mut self) -> Result<(), DbError> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
        }
        Ok(())
    }

    pub(crate) async fn rollback(&mut self) -> Result<(), DbError> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
        }
        Ok(())
    }
}

/// Handle to one store session.
#[derive(Clone)]
pub struct Session {
    id: u64,
    state: Arc<Mutex<SessionState>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl Session {
    fn new(conn: DatabaseConnection) -> Self {
        Self {
            id: NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed),
            state: Arc::new(Mutex::new(SessionState {
                conn,
                tx: None,
                closed: false,
            })),
        }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().await
    }

    /// Finalize pending writes.
    ///
    /// # Errors
    /// Returns `DbError::Sea` if the store rejects the commit.
    pub async fn commit(&self) -> Result<(), DbError> {
        let mut state = self.lock().await;
        state.commit().await?;
        tracing::debug!(session = self.id, "session committed");
        Ok(())
    }

    /// Discard pending writes. A no-op when nothing is pending.
    ///
    /// # Errors
    /// Returns `DbError::Sea` if the store rejects the rollback.
    pub async fn rollback(&self) -> Result<(), DbError> {
        let mut state = self.lock().await;
        state.rollback().await?;
        tracing::debug!(session = self.id, "session rolled back");
        Ok(())
    }

    /// Wait for in-flight statements on this session to finish.
    ///
    /// Statements are sent as they are issued, so nothing else is pending.
    ///
    /// # Errors
    /// Returns `DbError::SessionClosed` on a closed session.
    pub async fn flush(&self) -> Result<(), DbError> {
        self.lock().await.ensure_open()
    }

    /// Roll back pending writes and refuse further statements.
    ///
    /// # Errors
    /// Returns `DbError::Sea` if the pending transaction cannot be rolled back;
    /// the session is closed regardless.
    pub async fn close(&self) -> Result<(), DbError> {
        let mut state = self.lock().await;
        let result = state.rollback().await;
        state.closed = true;
        tracing::debug!(session = self.id, "session closed");
        result
    }

    pub async fn is_closed(&self) -> bool {
        self.lock().await.closed
    }

    /// True while writes are pending.
    pub async fn in_transaction(&self) -> bool {
        self.lock().await.tx.is_some()
    }
}
