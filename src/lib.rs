//! Local emulation of the D1 database binding.
//!
//! Statements are prepared and bound the way the remote service expects, executed on an
//! embedded `SQLite` database through a single worker-owned connection, and answered with the
//! same result shapes and metadata envelope (`success`, `results`, `meta`).
//!
//! ```rust,no_run
//! use d1_middleware::prelude::*;
//!
//! # async fn demo() -> Result<(), D1Error> {
//! let db = D1Database::builder("local").persist_root("./.d1").build().await?;
//! db.exec("CREATE TABLE IF NOT EXISTS kv (k TEXT PRIMARY KEY, v BLOB)").await?;
//! let put = db.prepare("INSERT INTO kv (k, v) VALUES (?1, ?2) RETURNING k");
//! let res = put.bind([D1Value::from("a"), D1Value::from(vec![1_u8, 2, 3])]).run().await?;
//! assert_eq!(res.results.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod binding;
pub mod config;
pub mod database;
pub mod engine;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod results;
pub mod sql;
pub mod statement;
pub mod types;

pub use config::{D1Options, D1OptionsBuilder};
pub use database::D1Database;
pub use error::{D1Error, D1ErrorCause, D1ErrorKind};
pub use executor::AsyncDatabaseExecutor;
pub use results::{D1ExecResult, D1Meta, D1Result, D1Row, RawOptions};
pub use statement::D1PreparedStatement;
pub use types::{D1Value, MultiStatementPolicy};
