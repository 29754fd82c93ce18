mod parsers;
mod scanner;

use tracing::warn;

use crate::error::{D1Error, D1ErrorCause};
use crate::types::MultiStatementPolicy;

pub use scanner::Placeholder;
use scanner::{Token, TokenKind, tokenize};

/// What a statement does, judged from its leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    /// `SELECT`, `VALUES`, `EXPLAIN`, or a `WITH` that ends in `SELECT`.
    Query,
    /// `INSERT`, `UPDATE`, `DELETE`, `REPLACE` (possibly behind a `WITH`).
    Dml,
    /// `CREATE`, `DROP`, `ALTER`, `REINDEX`, `ANALYZE`.
    Schema,
    /// `BEGIN`, `COMMIT`, `END`, `ROLLBACK`, `SAVEPOINT`, `RELEASE`.
    Transaction,
    Pragma,
    Other,
}

impl StatementKind {
    fn from_keyword(keyword: &str) -> Self {
        match keyword.to_ascii_uppercase().as_str() {
            "SELECT" | "VALUES" | "EXPLAIN" => Self::Query,
            "INSERT" | "UPDATE" | "DELETE" | "REPLACE" => Self::Dml,
            "CREATE" | "DROP" | "ALTER" | "REINDEX" | "ANALYZE" => Self::Schema,
            "BEGIN" | "COMMIT" | "END" | "ROLLBACK" | "SAVEPOINT" | "RELEASE" => {
                Self::Transaction
            }
            "PRAGMA" => Self::Pragma,
            _ => Self::Other,
        }
    }

    #[must_use]
    pub fn is_read_only(self) -> bool {
        matches!(self, Self::Query)
    }
}

/// One statement cut out of a larger SQL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatement {
    text: String,
    kind: StatementKind,
    placeholders: Vec<Placeholder>,
}

impl SqlStatement {
    /// Trimmed statement text without its terminator.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    /// Placeholders in order of appearance.
    #[must_use]
    pub fn placeholders(&self) -> &[Placeholder] {
        &self.placeholders
    }

    #[must_use]
    pub fn has_placeholders(&self) -> bool {
        !self.placeholders.is_empty()
    }
}

/// Tracks `CREATE TRIGGER ... BEGIN ... END` bodies, whose inner `;` do not end the statement.
#[derive(Default)]
struct TriggerScan {
    words_seen: usize,
    is_trigger: bool,
    in_body: bool,
    case_depth: u32,
}

impl TriggerScan {
    fn observe(&mut self, token: &Token, sql: &str) {
        self.words_seen += 1;
        if self.words_seen <= 3 && token.is_keyword(sql, "TRIGGER") {
            self.is_trigger = true;
            return;
        }
        if !self.is_trigger {
            return;
        }
        if !self.in_body {
            if token.is_keyword(sql, "BEGIN") {
                self.in_body = true;
            }
        } else if token.is_keyword(sql, "CASE") {
            self.case_depth += 1;
        } else if token.is_keyword(sql, "END") {
            if self.case_depth > 0 {
                self.case_depth -= 1;
            } else {
                self.in_body = false;
            }
        }
    }
}

/// Split SQL text into its top-level statements.
///
/// Terminators inside string/blob literals, quoted identifiers, comments and trigger bodies do
/// not split. Statements that are empty or consist only of comments are dropped.
#[must_use]
pub fn split_statements(sql: &str) -> Vec<SqlStatement> {
    let tokens = tokenize(sql);
    let mut statements = Vec::new();
    let mut start = 0;
    let mut trigger = TriggerScan::default();

    for (idx, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::Semicolon if !trigger.in_body => {
                if let Some(statement) = build_statement(sql, &tokens[start..idx]) {
                    statements.push(statement);
                }
                start = idx + 1;
                trigger = TriggerScan::default();
            }
            TokenKind::Word => trigger.observe(token, sql),
            _ => {}
        }
    }
    if let Some(statement) = build_statement(sql, &tokens[start..]) {
        statements.push(statement);
    }

    statements
}

fn build_statement(sql: &str, tokens: &[Token]) -> Option<SqlStatement> {
    let first = tokens.first()?;
    let last = tokens.last()?;
    let placeholders = tokens
        .iter()
        .filter_map(|token| match &token.kind {
            TokenKind::Placeholder(p) => Some(p.clone()),
            _ => None,
        })
        .collect();

    Some(SqlStatement {
        text: sql[first.start..last.end].to_string(),
        kind: classify(sql, tokens),
        placeholders,
    })
}

fn classify(sql: &str, tokens: &[Token]) -> StatementKind {
    let Some(first_word) = tokens.iter().find(|t| t.kind == TokenKind::Word) else {
        return StatementKind::Other;
    };
    if !first_word.is_keyword(sql, "WITH") {
        return StatementKind::from_keyword(first_word.text(sql));
    }

    // The statement a CTE prefix belongs to is the first verb back at paren depth zero.
    let mut depth = 0_u32;
    for token in tokens {
        match token.kind {
            TokenKind::OpenParen => depth += 1,
            TokenKind::CloseParen => depth = depth.saturating_sub(1),
            TokenKind::Word if depth == 0 => {
                let kind = StatementKind::from_keyword(token.text(sql));
                if matches!(kind, StatementKind::Query | StatementKind::Dml) {
                    return kind;
                }
            }
            _ => {}
        }
    }
    StatementKind::Other
}

/// Pick the one statement a single-statement call executes.
///
/// # Errors
///
/// Returns `NoStatements` for empty input, or `MultipleStatements` when the text holds several
/// statements and `policy` does not allow running the last one.
pub fn select_single(
    sql: &str,
    policy: MultiStatementPolicy,
) -> Result<SqlStatement, D1Error> {
    let mut statements = split_statements(sql);
    let count = statements.len();
    let Some(last) = statements.pop() else {
        return Err(D1ErrorCause::NoStatements.into());
    };
    if count == 1 {
        return Ok(last);
    }

    let allowed = match policy {
        MultiStatementPolicy::Strict => false,
        MultiStatementPolicy::FinalStatementWithParams => {
            last.has_placeholders() && statements.iter().all(|s| !s.has_placeholders())
        }
        MultiStatementPolicy::ExecuteLast => true,
    };
    if !allowed {
        return Err(D1ErrorCause::MultipleStatements.into());
    }

    warn!(
        skipped = count - 1,
        statement = last.text(),
        "multi-statement input: executing only the final statement"
    );
    Ok(last)
}
