use std::time::Duration;

use serde::Serialize;

use crate::engine::StatementOutput;

/// Per-call metadata envelope, field names matching the D1 wire format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct D1Meta {
    /// Elapsed time in milliseconds.
    pub duration: f64,
    /// Database size in bytes once the call finished (after commit for batches).
    pub size_after: u64,
    pub rows_read: u64,
    pub rows_written: u64,
    /// Rowid of the most recent successful INSERT on the connection.
    pub last_row_id: i64,
    pub changed_db: bool,
    pub changes: u64,
    pub served_by: String,
}

impl D1Meta {
    /// Combine engine counters with call-level timing and identity.
    #[must_use]
    pub fn synthesize(
        output: &StatementOutput,
        elapsed: Duration,
        size_after: u64,
        served_by: &str,
    ) -> Self {
        Self {
            duration: duration_ms(elapsed),
            size_after,
            rows_read: output.rows_read,
            rows_written: output.rows_written,
            last_row_id: output.last_row_id,
            changed_db: output.changed_db,
            changes: output.changes,
            served_by: served_by.to_string(),
        }
    }
}

pub(crate) fn duration_ms(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}
