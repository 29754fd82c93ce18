mod meta;
mod row;

use serde::Serialize;

use crate::engine::StatementOutput;
use crate::error::{D1Error, D1ErrorCause};
use crate::types::D1Value;

pub use meta::D1Meta;
pub(crate) use meta::duration_ms;
pub use row::D1Row;

/// Envelope returned by `run`, `all` and each `batch` entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct D1Result<T = D1Row> {
    pub success: bool,
    pub results: Vec<T>,
    pub meta: D1Meta,
}

/// Envelope returned by `exec`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct D1ExecResult {
    /// Number of statements executed.
    pub count: usize,
    /// Elapsed time in milliseconds.
    pub duration: f64,
}

/// Options for `raw`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawOptions {
    /// Prefix the rows with one row of column names.
    pub column_names: bool,
}

impl RawOptions {
    #[must_use]
    pub fn with_column_names(mut self, column_names: bool) -> Self {
        self.column_names = column_names;
        self
    }
}

/// Object shape: one [`D1Row`] per engine row.
#[must_use]
pub fn object_rows(output: StatementOutput) -> Vec<D1Row> {
    let columns = output.columns;
    output
        .rows
        .into_iter()
        .map(|values| D1Row::from_columns(&columns, values))
        .collect()
}

/// Raw shape: positional rows in SELECT order, every duplicate column kept.
#[must_use]
pub fn raw_rows(output: StatementOutput, options: RawOptions) -> Vec<Vec<D1Value>> {
    let mut rows = Vec::with_capacity(output.rows.len() + usize::from(options.column_names));
    if options.column_names {
        rows.push(
            output
                .columns
                .iter()
                .map(|name| D1Value::Text(name.clone()))
                .collect(),
        );
    }
    rows.extend(output.rows);
    rows
}

/// First row in object shape, `None` when the statement produced no rows.
#[must_use]
pub fn first_row(output: StatementOutput) -> Option<D1Row> {
    let columns = output.columns;
    output
        .rows
        .into_iter()
        .next()
        .map(|values| D1Row::from_columns(&columns, values))
}

/// Scalar shape: one column of the first row, `None` when there is no first row.
///
/// # Errors
///
/// Returns `ColumnNotFound` when a first row exists but has no column named `column`.
pub fn first_value(output: StatementOutput, column: &str) -> Result<Option<D1Value>, D1Error> {
    match first_row(output) {
        None => Ok(None),
        Some(row) => row
            .get(column)
            .cloned()
            .map(Some)
            .ok_or_else(|| D1ErrorCause::ColumnNotFound(column.to_string()).into()),
    }
}
