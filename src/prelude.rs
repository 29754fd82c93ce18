//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types so a single glob import is enough to
//! open a database, prepare statements and inspect results.

pub use crate::config::{D1Options, D1OptionsBuilder};
pub use crate::database::D1Database;
pub use crate::error::{D1Error, D1ErrorCause, D1ErrorKind};
pub use crate::executor::AsyncDatabaseExecutor;
pub use crate::results::{D1ExecResult, D1Meta, D1Result, D1Row, RawOptions};
pub use crate::statement::D1PreparedStatement;
pub use crate::types::{D1Value, MultiStatementPolicy};
