use crate::error::D1Error;
use crate::sql::{Placeholder, SqlStatement, StatementKind};
use crate::types::D1Value;

/// Highest `?N` index the bundled `SQLite` accepts (`SQLITE_MAX_VARIABLE_NUMBER`).
pub const MAX_PLACEHOLDER_INDEX: usize = 32_766;

/// A single statement with every placeholder resolved against its values.
///
/// Value `i` (0-based) binds to engine parameter `i + 1`, which is exactly what `?N` addresses,
/// so anonymous and numbered placeholders can be mixed and reused.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    sql: String,
    kind: StatementKind,
    params: Vec<D1Value>,
}

impl BoundStatement {
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    #[must_use]
    pub fn params(&self) -> &[D1Value] {
        &self.params
    }
}

/// Number of values a statement needs, following `SQLite`'s numbering: `?` takes the next index
/// after the largest seen so far, `?N` takes `N`.
///
/// # Errors
///
/// Returns a binding error for named placeholders, `?0`, or indices past
/// [`MAX_PLACEHOLDER_INDEX`].
pub fn parameter_count(placeholders: &[Placeholder]) -> Result<usize, D1Error> {
    let mut count = 0_usize;
    for placeholder in placeholders {
        match placeholder {
            Placeholder::Anonymous => count += 1,
            Placeholder::Numbered(index) => {
                if *index == 0 || *index > MAX_PLACEHOLDER_INDEX {
                    return Err(D1Error::binding(format!(
                        "Invalid placeholder index ?{index}: must be between 1 and {MAX_PLACEHOLDER_INDEX}"
                    )));
                }
                count = count.max(*index);
            }
            Placeholder::Named(name) => {
                return Err(D1Error::binding(format!(
                    "Named parameter {name} is not supported; use ? or ?N placeholders"
                )));
            }
        }
    }
    if count > MAX_PLACEHOLDER_INDEX {
        return Err(D1Error::binding(format!(
            "Too many placeholders: {count} exceeds {MAX_PLACEHOLDER_INDEX}"
        )));
    }
    Ok(count)
}

/// Resolve a statement's placeholders against `values`.
///
/// # Errors
///
/// Returns a binding error when a `?N` points past the supplied values or when the number of
/// values differs from the number of parameters the statement declares.
pub fn bind_statement(statement: SqlStatement, values: &[D1Value]) -> Result<BoundStatement, D1Error> {
    let expected = parameter_count(statement.placeholders())?;

    if let Some(index) = statement.placeholders().iter().find_map(|p| match p {
        Placeholder::Numbered(index) if *index > values.len() => Some(*index),
        _ => None,
    }) {
        return Err(D1Error::binding(format!(
            "Unknown placeholder index ?{index}: only {} value(s) bound",
            values.len()
        )));
    }
    if expected != values.len() {
        return Err(arity_error(expected, values.len()));
    }

    Ok(BoundStatement {
        kind: statement.kind(),
        sql: statement.text().to_string(),
        params: values.to_vec(),
    })
}

pub(crate) fn arity_error(expected: usize, actual: usize) -> D1Error {
    D1Error::binding(format!(
        "Wrong number of parameter bindings for SQL query: expected {expected}, got {actual}."
    ))
}
