// Engine module - owns the embedded SQLite connection
//
// - channel: command protocol between callers and the worker thread
// - manager: worker spawn and request/response plumbing
// - dispatcher: the worker loop and statement/batch/script execution
// - query: row extraction and size probing

mod channel;
mod dispatcher;
mod manager;
mod query;

use std::sync::Arc;
use std::time::Duration;

use crate::binding::BoundStatement;
use crate::error::D1Error;
use crate::sql::SqlStatement;
use crate::types::D1Value;

use manager::EngineWorker;
pub(crate) use query::database_size;

/// Everything the engine reports about one executed statement.
#[derive(Debug, Clone)]
pub struct StatementOutput {
    /// Result column names in SELECT order, duplicates included.
    pub columns: Arc<Vec<String>>,
    pub rows: Vec<Vec<D1Value>>,
    /// The engine judged the statement unable to write.
    pub readonly: bool,
    pub changes: u64,
    pub last_row_id: i64,
    pub rows_read: u64,
    pub rows_written: u64,
    pub changed_db: bool,
    pub elapsed: Duration,
}

impl StatementOutput {
    /// Rows produced by a writing statement only exist when it had a `RETURNING` clause.
    #[must_use]
    pub fn has_returning(&self) -> bool {
        !self.readonly && !self.columns.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct BatchOutput {
    pub outputs: Vec<StatementOutput>,
    /// Size in bytes after the batch committed.
    pub size_after: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct ExecOutput {
    pub count: usize,
    pub size_after: u64,
}

/// Handle to the single connection of one database, backed by a dedicated worker thread.
///
/// Every command is processed in arrival order on that thread, so statements never run
/// concurrently and nothing can interleave with an open batch transaction.
#[derive(Clone)]
pub struct EngineConnection {
    worker: Arc<EngineWorker>,
}

impl EngineConnection {
    /// Move `conn` onto a new worker thread.
    ///
    /// # Errors
    /// Returns [`D1Error`] if the worker thread cannot be spawned.
    pub fn spawn(conn: rusqlite::Connection, name: &str) -> Result<Self, D1Error> {
        let worker = EngineWorker::spawn(conn, name)?;
        Ok(Self {
            worker: Arc::new(worker),
        })
    }

    /// Execute one bound statement, returning its output and the database size afterwards.
    ///
    /// # Errors
    /// Propagates the engine error unchanged, or a connection error if the worker is gone.
    pub async fn execute(
        &self,
        statement: BoundStatement,
    ) -> Result<(StatementOutput, u64), D1Error> {
        self.worker.execute(statement).await
    }

    /// Execute bound statements atomically.
    ///
    /// # Errors
    /// Returns the first failing statement's error after rolling the whole batch back.
    pub async fn batch(&self, statements: Vec<BoundStatement>) -> Result<BatchOutput, D1Error> {
        self.worker.batch(statements).await
    }

    /// Execute parameterless statements one by one without a surrounding transaction.
    ///
    /// # Errors
    /// Returns the first failing statement's error; earlier statements stay applied.
    pub async fn exec(&self, statements: Vec<SqlStatement>) -> Result<ExecOutput, D1Error> {
        self.worker.exec(statements).await
    }

    /// Run synchronous `rusqlite` logic against the worker-owned connection.
    ///
    /// # Errors
    /// Propagates any [`D1Error`] raised by the callback or while talking to the worker.
    pub async fn with_connection<F, R>(&self, func: F) -> Result<R, D1Error>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R, D1Error> + Send + 'static,
        R: Send + 'static,
    {
        self.worker.with_connection(func).await
    }

    /// Ask the worker to stop; later calls fail with a connection error.
    ///
    /// # Errors
    /// Returns a connection error if the worker already stopped.
    pub fn shutdown(&self) -> Result<(), D1Error> {
        self.worker.send_command(channel::Command::Shutdown)
    }
}

impl std::fmt::Debug for EngineConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConnection").finish_non_exhaustive()
    }
}
