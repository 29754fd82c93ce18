use async_trait::async_trait;

use crate::database::D1Database;
use crate::error::D1Error;
use crate::results::{D1ExecResult, D1Result};
use crate::statement::D1PreparedStatement;

/// Database-level operations, for code that wants to stay generic over the executor.
#[async_trait]
pub trait AsyncDatabaseExecutor {
    /// Runs a parameterless script statement by statement, outside a transaction.
    async fn exec(&self, script: &str) -> Result<D1ExecResult, D1Error>;

    /// Runs prepared statements as one all-or-nothing transaction.
    async fn batch(&self, statements: &[D1PreparedStatement]) -> Result<Vec<D1Result>, D1Error>;
}

#[async_trait]
impl AsyncDatabaseExecutor for D1Database {
    async fn exec(&self, script: &str) -> Result<D1ExecResult, D1Error> {
        D1Database::exec(self, script).await
    }

    async fn batch(&self, statements: &[D1PreparedStatement]) -> Result<Vec<D1Result>, D1Error> {
        D1Database::batch(self, statements).await
    }
}
