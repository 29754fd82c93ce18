use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Instant;

use rusqlite::{StatementStatus, TransactionBehavior};
use tracing::{debug, error, warn};

use crate::binding::{BoundStatement, arity_error};
use crate::error::D1Error;
use crate::sql::{SqlStatement, StatementKind};

use super::channel::{BoxedCallback, BoxedResponse, Command};
use super::query::{ChangeFingerprint, collect_rows, database_size};
use super::{BatchOutput, ExecOutput, StatementOutput};

pub(super) fn run_engine_worker(mut conn: rusqlite::Connection, receiver: &Receiver<Command>) {
    while let Ok(command) = receiver.recv() {
        match command {
            Command::Shutdown => break,
            Command::Execute {
                statement,
                respond_to,
            } => {
                let _ = respond_to.send(execute_single(&conn, &statement));
            }
            Command::Batch {
                statements,
                respond_to,
            } => {
                let _ = respond_to.send(execute_batch(&mut conn, &statements));
            }
            Command::Exec {
                statements,
                respond_to,
            } => {
                let _ = respond_to.send(execute_script(&conn, &statements));
            }
            Command::WithConnection {
                callback,
                respond_to,
            } => {
                let _ = respond_to.send(run_custom_callback(&mut conn, callback));
            }
        }
    }
    debug!("engine worker shutting down");
}

fn execute_single(
    conn: &rusqlite::Connection,
    statement: &BoundStatement,
) -> Result<(StatementOutput, u64), D1Error> {
    let output = execute_statement(conn, statement)?;
    Ok((output, database_size(conn)?))
}

/// Run every statement inside one IMMEDIATE transaction; the first failure rolls all of them back
/// and no per-statement output survives.
fn execute_batch(
    conn: &mut rusqlite::Connection,
    statements: &[BoundStatement],
) -> Result<BatchOutput, D1Error> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    debug!(statements = statements.len(), "batch transaction started");

    let mut outputs = Vec::with_capacity(statements.len());
    for (index, statement) in statements.iter().enumerate() {
        match execute_statement(&tx, statement) {
            Ok(output) => outputs.push(output),
            Err(err) => {
                warn!(index, statement = statement.sql(), error = %err, "batch statement failed, rolling back");
                if let Err(rollback_err) = tx.rollback() {
                    error!(error = %rollback_err, "batch rollback failed");
                }
                return Err(err);
            }
        }
    }

    tx.commit()?;
    debug!(statements = outputs.len(), "batch committed");
    Ok(BatchOutput {
        outputs,
        size_after: database_size(conn)?,
    })
}

/// Run script statements one after another in autocommit mode, discarding any rows.
fn execute_script(
    conn: &rusqlite::Connection,
    statements: &[SqlStatement],
) -> Result<ExecOutput, D1Error> {
    let mut count = 0;
    for (index, statement) in statements.iter().enumerate() {
        let mut stmt = conn.prepare(statement.text()).inspect_err(|err| {
            warn!(index, statement = statement.text(), error = %err, "exec statement failed");
        })?;
        let mut rows = stmt.raw_query();
        while rows.next()?.is_some() {}
        count += 1;
    }
    Ok(ExecOutput {
        count,
        size_after: database_size(conn)?,
    })
}

pub(super) fn execute_statement(
    conn: &rusqlite::Connection,
    statement: &BoundStatement,
) -> Result<StatementOutput, D1Error> {
    let started = Instant::now();
    let mut stmt = conn.prepare(statement.sql())?;

    let expected = stmt.parameter_count();
    if expected != statement.params().len() {
        return Err(arity_error(expected, statement.params().len()));
    }
    for (idx, value) in statement.params().iter().enumerate() {
        stmt.raw_bind_parameter(idx + 1, value)?;
    }

    let readonly = stmt.readonly();
    // DDL and pragmas report no row changes; compare engine counters around them instead.
    let before = if !readonly
        && matches!(
            statement.kind(),
            StatementKind::Schema | StatementKind::Pragma | StatementKind::Other
        ) {
        Some(ChangeFingerprint::capture(conn)?)
    } else {
        None
    };
    let columns: Arc<Vec<String>> = Arc::new(
        stmt.column_names()
            .into_iter()
            .map(str::to_owned)
            .collect(),
    );
    let rows = {
        let mut cursor = stmt.raw_query();
        collect_rows(&mut cursor, columns.len())?
    };

    let full_scan_steps = u64::try_from(stmt.get_status(StatementStatus::FullscanStep))
        .unwrap_or_default();
    let changes = if !readonly && statement.kind() == StatementKind::Dml {
        u64::try_from(conn.changes()).unwrap_or_default()
    } else {
        0
    };
    let changed_db = match before {
        Some(before) => ChangeFingerprint::capture(conn)? != before,
        None => changes > 0,
    };
    let row_count = u64::try_from(rows.len()).unwrap_or_default();

    let output = StatementOutput {
        columns,
        rows,
        readonly,
        changes,
        last_row_id: conn.last_insert_rowid(),
        rows_read: row_count.max(full_scan_steps),
        rows_written: changes,
        changed_db,
        elapsed: started.elapsed(),
    };
    debug!(
        kind = ?statement.kind(),
        changes = output.changes,
        rows = output.rows.len(),
        elapsed_us = u64::try_from(output.elapsed.as_micros()).unwrap_or_default(),
        "statement executed"
    );
    Ok(output)
}

fn run_custom_callback(conn: &mut rusqlite::Connection, callback: BoxedCallback) -> BoxedResponse {
    callback(conn)
}
