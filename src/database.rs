use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::binding::{BoundStatement, bind_statement};
use crate::config::{D1Options, D1OptionsBuilder, encode_database_id};
use crate::engine::{EngineConnection, StatementOutput, database_size};
use crate::error::{D1Error, D1ErrorCause};
use crate::results::{D1ExecResult, D1Meta, D1Result, duration_ms, object_rows};
use crate::sql::{SqlStatement, select_single, split_statements};
use crate::statement::D1PreparedStatement;

#[derive(Debug)]
struct DatabaseInner {
    engine: EngineConnection,
    options: D1Options,
    path: Option<PathBuf>,
}

/// One emulated D1 database.
///
/// Clones share the same underlying connection and worker thread; all statements against the
/// database are executed one at a time on that worker.
///
/// ```rust,no_run
/// use d1_middleware::prelude::*;
///
/// # async fn demo() -> Result<(), D1Error> {
/// let db = D1Database::builder("colours").build().await?;
/// db.exec("CREATE TABLE colours (id INTEGER PRIMARY KEY, name TEXT NOT NULL, rgb INTEGER)")
///     .await?;
/// let insert = db.prepare("INSERT INTO colours (id, name, rgb) VALUES (?1, ?2, ?3)");
/// db.batch(&[
///     insert.bind([D1Value::from(1), "red".into(), 0xff0000_i64.into()]),
///     insert.bind([D1Value::from(2), "green".into(), 0x00ff00_i64.into()]),
/// ])
/// .await?;
/// let name = db
///     .prepare("SELECT name FROM colours WHERE id = ?")
///     .bind([2_i64])
///     .first_column("name")
///     .await?;
/// assert_eq!(name, Some(D1Value::from("green")));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct D1Database {
    inner: Arc<DatabaseInner>,
}

impl D1Database {
    #[must_use]
    pub fn builder(database_id: impl Into<String>) -> D1OptionsBuilder {
        D1OptionsBuilder::new(database_id)
    }

    /// Open (creating if needed) the database described by `options`.
    ///
    /// # Errors
    ///
    /// Returns `D1Error` if the options are invalid, the persistence directory cannot be created,
    /// or the engine fails to open or configure the database.
    pub async fn open(options: D1Options) -> Result<Self, D1Error> {
        let path = options.database_path()?;
        let worker_name = encode_database_id(&options.database_id)?;

        let conn = match &path {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).map_err(|err| {
                        D1Error::config(format!(
                            "failed to create persistence directory {}: {err}",
                            parent.display()
                        ))
                    })?;
                }
                rusqlite::Connection::open(path)?
            }
            None => rusqlite::Connection::open_in_memory()?,
        };
        let engine = EngineConnection::spawn(conn, &worker_name)?;

        let file_backed = path.is_some();
        let foreign_keys = options.foreign_keys;
        engine
            .with_connection(move |conn| {
                if file_backed {
                    let _mode: String =
                        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
                }
                conn.pragma_update(None, "foreign_keys", foreign_keys)?;
                Ok(())
            })
            .await?;

        info!(
            database_id = %options.database_id,
            path = ?path,
            "opened D1 database"
        );
        Ok(Self {
            inner: Arc::new(DatabaseInner {
                engine,
                options,
                path,
            }),
        })
    }

    #[must_use]
    pub fn options(&self) -> &D1Options {
        &self.inner.options
    }

    /// File backing this database, `None` when in memory.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    /// Create a statement; nothing is parsed or executed until it runs.
    #[must_use]
    pub fn prepare(&self, sql: impl Into<String>) -> D1PreparedStatement {
        D1PreparedStatement::new(self.clone(), sql.into())
    }

    /// Execute statements as one atomic unit.
    ///
    /// Every statement is split and bound before anything runs. On success each entry carries
    /// the statement's rows in object shape (empty for writes without `RETURNING`). If any
    /// statement fails, all effects of the batch are rolled back and that error is returned.
    ///
    /// # Errors
    ///
    /// Returns the first preparation, binding or engine error.
    pub async fn batch(
        &self,
        statements: &[D1PreparedStatement],
    ) -> Result<Vec<D1Result>, D1Error> {
        let bound = statements
            .iter()
            .map(|statement| self.bind(statement))
            .collect::<Result<Vec<_>, _>>()?;
        if bound.is_empty() {
            return Ok(Vec::new());
        }

        let output = self.inner.engine.batch(bound).await?;
        let size_after = output.size_after;
        Ok(output
            .outputs
            .into_iter()
            .map(|out| {
                let meta = D1Meta::synthesize(&out, out.elapsed, size_after, &self.inner.options.served_by);
                D1Result {
                    success: true,
                    results: object_rows(out),
                    meta,
                }
            })
            .collect())
    }

    /// Run a script of `;`-separated statements in order, outside any transaction.
    ///
    /// Rows are discarded; only the statement count and elapsed time are reported. A failure
    /// leaves earlier statements applied.
    ///
    /// # Errors
    ///
    /// Returns `NoStatements` for an empty script, a binding error if any statement contains a
    /// placeholder (nothing runs in that case), otherwise the first engine error.
    pub async fn exec(&self, script: &str) -> Result<D1ExecResult, D1Error> {
        let started = Instant::now();
        let statements = split_statements(script);
        if statements.is_empty() {
            return Err(D1ErrorCause::NoStatements.into());
        }
        // Scripts take no values; running them would bind every placeholder as NULL.
        if let Some(position) = statements.iter().position(SqlStatement::has_placeholders) {
            return Err(D1Error::binding(format!(
                "exec does not accept bound parameters: statement {} contains a placeholder",
                position + 1
            )));
        }
        let output = self.inner.engine.exec(statements).await?;
        debug!(count = output.count, size_after = output.size_after, "exec finished");
        Ok(D1ExecResult {
            count: output.count,
            duration: duration_ms(started.elapsed()),
        })
    }

    /// Current database size in bytes.
    ///
    /// # Errors
    ///
    /// Returns `D1Error` if the engine cannot be queried.
    pub async fn size(&self) -> Result<u64, D1Error> {
        self.inner
            .engine
            .with_connection(|conn| database_size(conn))
            .await
    }

    /// Run synchronous `rusqlite` logic on the database's connection, serialized with every other
    /// call.
    ///
    /// # Errors
    ///
    /// Propagates the callback's error or a connection error.
    pub async fn with_connection<F, R>(&self, func: F) -> Result<R, D1Error>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R, D1Error> + Send + 'static,
        R: Send + 'static,
    {
        self.inner.engine.with_connection(func).await
    }

    /// Stop the worker thread. Later calls on any clone fail with a connection error.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the database was already closed.
    pub fn close(&self) -> Result<(), D1Error> {
        info!(database_id = %self.inner.options.database_id, "closing D1 database");
        self.inner.engine.shutdown()
    }

    /// Resolve a prepared statement to the single statement it executes, with values bound.
    fn bind(&self, statement: &D1PreparedStatement) -> Result<BoundStatement, D1Error> {
        let selected = select_single(statement.sql(), self.inner.options.multi_statement_policy)?;
        bind_statement(selected, statement.params())
    }

    /// Execute a prepared statement on its own and build its metadata envelope.
    pub(crate) async fn execute_prepared(
        &self,
        statement: &D1PreparedStatement,
    ) -> Result<(StatementOutput, D1Meta), D1Error> {
        let started = Instant::now();
        let bound = self.bind(statement)?;
        let (output, size_after) = self.inner.engine.execute(bound).await?;
        let meta = D1Meta::synthesize(
            &output,
            started.elapsed(),
            size_after,
            &self.inner.options.served_by,
        );
        Ok((output, meta))
    }
}
