use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::database::D1Database;
use crate::error::D1Error;
use crate::results::{
    D1Result, D1Row, RawOptions, first_row, first_value, object_rows, raw_rows,
};
use crate::types::D1Value;

/// SQL text plus the values bound to it.
///
/// Statements are immutable: [`bind`](Self::bind) returns a new statement, so one prepared
/// statement can be bound many times (for example once per row of a batch insert).
#[derive(Debug, Clone)]
pub struct D1PreparedStatement {
    db: D1Database,
    sql: Arc<str>,
    params: Arc<[D1Value]>,
}

impl D1PreparedStatement {
    pub(crate) fn new(db: D1Database, sql: String) -> Self {
        Self {
            db,
            sql: Arc::from(sql),
            params: Arc::from(Vec::new()),
        }
    }

    /// Access the raw SQL string of the statement.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn params(&self) -> &[D1Value] {
        &self.params
    }

    /// Copy of this statement with `values` replacing any previously bound values.
    ///
    /// Value `i` binds to `?{i+1}`; plain `?` placeholders consume values left to right.
    #[must_use]
    pub fn bind<I, V>(&self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<D1Value>,
    {
        Self {
            db: self.db.clone(),
            sql: Arc::clone(&self.sql),
            params: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Like [`bind`](Self::bind) for untyped JSON input.
    ///
    /// # Errors
    ///
    /// Returns a binding error for values without a SQL representation, such as objects.
    pub fn bind_json(&self, values: &[JsonValue]) -> Result<Self, D1Error> {
        let params = values
            .iter()
            .map(D1Value::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.bind(params))
    }

    /// Execute for side effects. Rows are returned only by writes with a `RETURNING` clause.
    ///
    /// # Errors
    ///
    /// Returns multi-statement, binding, or engine errors.
    pub async fn run(&self) -> Result<D1Result, D1Error> {
        let (output, meta) = self.db.execute_prepared(self).await?;
        let results = if output.has_returning() {
            object_rows(output)
        } else {
            Vec::new()
        };
        Ok(D1Result {
            success: true,
            results,
            meta,
        })
    }

    /// Execute and return every row in object shape.
    ///
    /// # Errors
    ///
    /// Returns multi-statement, binding, or engine errors.
    pub async fn all(&self) -> Result<D1Result, D1Error> {
        let (output, meta) = self.db.execute_prepared(self).await?;
        Ok(D1Result {
            success: true,
            results: object_rows(output),
            meta,
        })
    }

    /// Execute and return rows as positional arrays, optionally headed by the column names.
    ///
    /// # Errors
    ///
    /// Returns multi-statement, binding, or engine errors.
    pub async fn raw(&self, options: RawOptions) -> Result<Vec<Vec<D1Value>>, D1Error> {
        let (output, _meta) = self.db.execute_prepared(self).await?;
        Ok(raw_rows(output, options))
    }

    /// Execute and return only the first row. The statement still runs to completion.
    ///
    /// # Errors
    ///
    /// Returns multi-statement, binding, or engine errors.
    pub async fn first(&self) -> Result<Option<D1Row>, D1Error> {
        let (output, _meta) = self.db.execute_prepared(self).await?;
        Ok(first_row(output))
    }

    /// Execute and return one column of the first row; `None` when no row was produced.
    ///
    /// # Errors
    ///
    /// Returns `ColumnNotFound` if a first row exists without `column`, or any execution error.
    pub async fn first_column(&self, column: &str) -> Result<Option<D1Value>, D1Error> {
        let (output, _meta) = self.db.execute_prepared(self).await?;
        first_value(output, column)
    }
}
