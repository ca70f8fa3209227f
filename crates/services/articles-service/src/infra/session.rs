//! Relational store session.
//!
//! Wraps a SeaORM transaction that is opened on first use and reopened after
//! every commit, so one unit of work can commit several times.

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, SqlErr, TransactionTrait};
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use uow::{SessionId, StoreError, StoreSession, UowError, UowResult};

pub const POSTGRES_STORE: &str = "postgres";

/// Wrap a driver error so it can be recovered by downcasting later.
/// Unique constraint violations are flagged as conflicts.
pub fn db_error(err: DbErr) -> UowError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::conflict(POSTGRES_STORE, err),
        _ => StoreError::new(POSTGRES_STORE, err),
    }
    .into()
}

/// Session over the relational store.
pub struct DbSession {
    id: SessionId,
    connection: DatabaseConnection,
    transaction: Mutex<Option<DatabaseTransaction>>,
}

impl DbSession {
    pub fn new(connection: DatabaseConnection) -> Self {
        Self {
            id: SessionId::next(),
            connection,
            transaction: Mutex::new(None),
        }
    }

    /// Live transaction, begun now if none is open.
    ///
    /// The guard keeps other operations on this session waiting, so hold it
    /// only for the duration of one query.
    pub async fn transaction(&self) -> UowResult<MappedMutexGuard<'_, DatabaseTransaction>> {
        let mut slot = self.transaction.lock().await;
        if slot.is_none() {
            let txn = self.connection.begin().await.map_err(db_error)?;
            tracing::debug!(session = %self.id, "Transaction started");
            *slot = Some(txn);
        }

        MutexGuard::try_map(slot, Option::as_mut)
            .map_err(|_| UowError::lifecycle("transaction slot emptied while locked"))
    }

    async fn take(&self) -> Option<DatabaseTransaction> {
        self.transaction.lock().await.take()
    }
}

#[async_trait]
impl StoreSession for DbSession {
    type Output = ();

    fn id(&self) -> SessionId {
        self.id
    }

    fn store(&self) -> &'static str {
        POSTGRES_STORE
    }

    async fn begin(&self) -> UowResult<()> {
        self.transaction().await.map(drop)
    }

    async fn commit(&self) -> UowResult<()> {
        if let Some(txn) = self.take().await {
            txn.commit().await.map_err(db_error)?;
            tracing::debug!(session = %self.id, "Transaction committed");
        }
        Ok(())
    }

    async fn rollback(&self) -> UowResult<()> {
        if let Some(txn) = self.take().await {
            txn.rollback().await.map_err(db_error)?;
            tracing::debug!(session = %self.id, "Transaction rolled back");
        }
        Ok(())
    }

    async fn close(&self) -> UowResult<()> {
        // Work left uncommitted at close is discarded.
        if let Some(txn) = self.take().await {
            txn.rollback().await.map_err(db_error)?;
        }
        Ok(())
    }
}
