use rusqlite::ErrorCode;
use thiserror::Error;

/// The underlying reason a D1 call failed.
///
/// Engine failures are carried as the original [`rusqlite::Error`] so callers can inspect the
/// verbatim `SQLite` message (e.g. `near "nonsense": syntax error`).
#[derive(Debug, Error)]
pub enum D1ErrorCause {
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("A prepared SQL statement must contain only one statement.")]
    MultipleStatements,

    #[error("No SQL statements detected.")]
    NoStatements,

    #[error("{0}")]
    BindingError(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),
}

/// Broad classification of a [`D1Error`], for callers that branch on failure type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum D1ErrorKind {
    /// The SQL text is malformed and could not be parsed.
    Syntax,
    /// A single-statement call received several statements.
    MultiStatement,
    /// Parameter arity, index or type mismatch.
    Binding,
    /// Uniqueness, foreign-key, check or not-null violation.
    Constraint,
    /// `first_column` named a column the result does not have.
    ColumnNotFound,
    /// Any other engine failure, including references to missing tables or columns.
    Engine,
    /// The worker owning the connection is gone.
    Connection,
    /// Invalid database options.
    Config,
}

/// Uniform outer error for every D1 operation.
///
/// Display is always prefixed with [`D1Error::DISCRIMINATOR`]; the original failure stays
/// reachable through [`std::error::Error::source`] and [`D1Error::cause`].
#[derive(Debug, Error)]
#[error("{}: {}", D1Error::DISCRIMINATOR, .cause)]
pub struct D1Error {
    #[source]
    cause: D1ErrorCause,
}

impl D1Error {
    pub const DISCRIMINATOR: &'static str = "D1_ERROR";

    #[must_use]
    pub fn new(cause: D1ErrorCause) -> Self {
        Self { cause }
    }

    pub(crate) fn binding(message: impl Into<String>) -> Self {
        Self::new(D1ErrorCause::BindingError(message.into()))
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::new(D1ErrorCause::ConfigError(message.into()))
    }

    pub(crate) fn connection(message: impl Into<String>) -> Self {
        Self::new(D1ErrorCause::ConnectionError(message.into()))
    }

    #[must_use]
    pub fn cause(&self) -> &D1ErrorCause {
        &self.cause
    }

    #[must_use]
    pub fn into_cause(self) -> D1ErrorCause {
        self.cause
    }

    #[must_use]
    pub fn kind(&self) -> D1ErrorKind {
        match &self.cause {
            D1ErrorCause::SqliteError(err) => classify_sqlite(err),
            D1ErrorCause::MultipleStatements | D1ErrorCause::NoStatements => {
                D1ErrorKind::MultiStatement
            }
            D1ErrorCause::BindingError(_) => D1ErrorKind::Binding,
            D1ErrorCause::ColumnNotFound(_) => D1ErrorKind::ColumnNotFound,
            D1ErrorCause::ConfigError(_) => D1ErrorKind::Config,
            D1ErrorCause::ConnectionError(_) => D1ErrorKind::Connection,
        }
    }

    /// The engine's own message, untouched, when the failure came from `SQLite`.
    #[must_use]
    pub fn engine_message(&self) -> Option<&str> {
        match &self.cause {
            D1ErrorCause::SqliteError(rusqlite::Error::SqliteFailure(_, Some(message))) => {
                Some(message.as_str())
            }
            D1ErrorCause::SqliteError(rusqlite::Error::SqlInputError { msg, .. }) => {
                Some(msg.as_str())
            }
            _ => None,
        }
    }
}

impl From<D1ErrorCause> for D1Error {
    fn from(cause: D1ErrorCause) -> Self {
        Self::new(cause)
    }
}

impl From<rusqlite::Error> for D1Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::new(D1ErrorCause::SqliteError(err))
    }
}

/// Message fragments `SQLite` uses when the SQL text itself cannot be parsed.
const SYNTAX_MARKERS: [&str; 3] = ["syntax error", "incomplete input", "unrecognized token"];

fn classify_sqlite(err: &rusqlite::Error) -> D1ErrorKind {
    match err {
        rusqlite::Error::SqliteFailure(failure, message) => {
            classify_failure(failure.code, message.as_deref())
        }
        rusqlite::Error::SqlInputError {
            error: failure,
            msg,
            ..
        } => classify_failure(failure.code, Some(msg.as_str())),
        rusqlite::Error::InvalidParameterCount(_, _)
        | rusqlite::Error::InvalidParameterName(_)
        | rusqlite::Error::ToSqlConversionFailure(_) => D1ErrorKind::Binding,
        rusqlite::Error::MultipleStatement => D1ErrorKind::MultiStatement,
        _ => D1ErrorKind::Engine,
    }
}

/// Generic `SQLITE_ERROR` covers both malformed SQL and semantic failures such as a missing
/// table; only the former is `Syntax`.
fn classify_failure(code: ErrorCode, message: Option<&str>) -> D1ErrorKind {
    match code {
        ErrorCode::ConstraintViolation => D1ErrorKind::Constraint,
        ErrorCode::Unknown
            if message.is_some_and(|msg| SYNTAX_MARKERS.iter().any(|m| msg.contains(m))) =>
        {
            D1ErrorKind::Syntax
        }
        _ => D1ErrorKind::Engine,
    }
}
