use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::database::D1Database;
use crate::error::D1Error;
use crate::types::MultiStatementPolicy;

/// Longest encoded database file stem we accept; keeps file names under common 255-byte limits.
const MAX_ENCODED_ID_LEN: usize = 200;

pub const DEFAULT_SERVED_BY: &str = "d1-middleware.local";

/// Options for opening a [`D1Database`].
#[derive(Debug, Clone, PartialEq)]
pub struct D1Options {
    /// Identity of the database; also keys its file under `persist_root`.
    pub database_id: String,
    /// Directory holding database files. `None` keeps the database in memory.
    pub persist_root: Option<PathBuf>,
    pub multi_statement_policy: MultiStatementPolicy,
    /// Value reported as `meta.served_by`.
    pub served_by: String,
    /// Enforce foreign keys (`PRAGMA foreign_keys = ON`).
    pub foreign_keys: bool,
}

impl D1Options {
    #[must_use]
    pub fn new(database_id: impl Into<String>) -> Self {
        Self {
            database_id: database_id.into(),
            persist_root: None,
            multi_statement_policy: MultiStatementPolicy::default(),
            served_by: DEFAULT_SERVED_BY.to_string(),
            foreign_keys: true,
        }
    }

    #[must_use]
    pub fn with_persist_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.persist_root = Some(root.into());
        self
    }

    #[must_use]
    pub fn with_multi_statement_policy(mut self, policy: MultiStatementPolicy) -> Self {
        self.multi_statement_policy = policy;
        self
    }

    /// Location of the database file, or `None` for an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns `D1Error` with a configuration cause if the identity is empty or too long to be
    /// used as a file name once encoded.
    pub fn database_path(&self) -> Result<Option<PathBuf>, D1Error> {
        let encoded = encode_database_id(&self.database_id)?;
        Ok(self
            .persist_root
            .as_deref()
            .map(|root| database_file(root, &encoded)))
    }
}

/// Fluent builder for [`D1Options`].
#[derive(Debug, Clone)]
pub struct D1OptionsBuilder {
    opts: D1Options,
}

impl D1OptionsBuilder {
    #[must_use]
    pub fn new(database_id: impl Into<String>) -> Self {
        Self {
            opts: D1Options::new(database_id),
        }
    }

    #[must_use]
    pub fn persist_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.opts.persist_root = Some(root.into());
        self
    }

    #[must_use]
    pub fn multi_statement_policy(mut self, policy: MultiStatementPolicy) -> Self {
        self.opts.multi_statement_policy = policy;
        self
    }

    #[must_use]
    pub fn served_by(mut self, served_by: impl Into<String>) -> Self {
        self.opts.served_by = served_by.into();
        self
    }

    #[must_use]
    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.opts.foreign_keys = enabled;
        self
    }

    #[must_use]
    pub fn finish(self) -> D1Options {
        self.opts
    }

    /// Open the database described by these options.
    ///
    /// # Errors
    ///
    /// Returns `D1Error` if the options are invalid or the database cannot be opened.
    pub async fn build(self) -> Result<D1Database, D1Error> {
        D1Database::open(self.finish()).await
    }
}

/// Encode a database identity into a file stem.
///
/// `[A-Za-z0-9_-]` pass through and every other byte becomes `%XX`, so distinct identities map
/// to distinct names and nothing like `/`, `..` or NUL reaches the file system.
///
/// # Errors
///
/// Returns a configuration error for an empty identity or one whose encoding exceeds the file name
/// budget.
pub fn encode_database_id(database_id: &str) -> Result<String, D1Error> {
    if database_id.is_empty() {
        return Err(D1Error::config("database id must not be empty"));
    }
    let mut encoded = String::with_capacity(database_id.len());
    for byte in database_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }
    if encoded.len() > MAX_ENCODED_ID_LEN {
        return Err(D1Error::config(format!(
            "database id encodes to {} bytes, limit is {MAX_ENCODED_ID_LEN}",
            encoded.len()
        )));
    }
    Ok(encoded)
}

fn database_file(root: &Path, encoded_id: &str) -> PathBuf {
    root.join(format!("{encoded_id}.sqlite"))
}
