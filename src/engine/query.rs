use rusqlite::types::Value;

use crate::error::D1Error;
use crate::types::D1Value;

/// Extract a `D1Value` from an engine row, keeping the storage class the engine reports.
///
/// # Errors
///
/// Returns `D1Error` if the column cannot be read.
pub(super) fn extract_value(row: &rusqlite::Row<'_>, idx: usize) -> Result<D1Value, D1Error> {
    let value: Value = row.get(idx)?;
    Ok(D1Value::from(value))
}

/// Read every remaining row of an executing statement.
pub(super) fn collect_rows(
    rows: &mut rusqlite::Rows<'_>,
    column_count: usize,
) -> Result<Vec<Vec<D1Value>>, D1Error> {
    let mut collected = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            values.push(extract_value(row, idx)?);
        }
        collected.push(values);
    }
    Ok(collected)
}

/// Counters that move whenever the database content or schema actually changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct ChangeFingerprint {
    schema_version: i64,
    user_version: i64,
    total_changes: i64,
}

impl ChangeFingerprint {
    pub(super) fn capture(conn: &rusqlite::Connection) -> Result<Self, D1Error> {
        Ok(Self {
            schema_version: conn.query_row("PRAGMA schema_version", [], |row| row.get(0))?,
            user_version: conn.query_row("PRAGMA user_version", [], |row| row.get(0))?,
            total_changes: conn.query_row("SELECT total_changes()", [], |row| row.get(0))?,
        })
    }
}

/// Database size in bytes: `page_count * page_size`.
pub(crate) fn database_size(conn: &rusqlite::Connection) -> Result<u64, D1Error> {
    let page_count: i64 = conn.query_row("PRAGMA page_count", [], |row| row.get(0))?;
    let page_size: i64 = conn.query_row("PRAGMA page_size", [], |row| row.get(0))?;
    Ok(u64::try_from(page_count.saturating_mul(page_size)).unwrap_or_default())
}
