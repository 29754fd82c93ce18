use super::parsers::{
    is_block_comment_end, is_block_comment_start, is_line_comment_start, is_word_start,
    quote_closer, scan_number, scan_word,
};

#[derive(Clone, Copy)]
enum State {
    Normal,
    Quoted(u8),
    LineComment,
    BlockComment,
}

/// A bind placeholder as written in the SQL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placeholder {
    /// `?`
    Anonymous,
    /// `?N`, 1-indexed. Out-of-range digit runs saturate to `usize::MAX`.
    Numbered(usize),
    /// `:name`, `@name` or `$name`.
    Named(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Word,
    Literal,
    Placeholder(Placeholder),
    Semicolon,
    OpenParen,
    CloseParen,
    Other,
}

#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) start: usize,
    pub(crate) end: usize,
}

impl Token {
    fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Self { kind, start, end }
    }

    pub(crate) fn text<'a>(&self, sql: &'a str) -> &'a str {
        &sql[self.start..self.end]
    }

    /// Case-insensitive keyword check; only meaningful for `Word` tokens.
    pub(crate) fn is_keyword(&self, sql: &str, keyword: &str) -> bool {
        self.kind == TokenKind::Word && self.text(sql).eq_ignore_ascii_case(keyword)
    }
}

/// Lex SQL text into tokens, skipping whitespace and comments.
///
/// Quoted strings, blob literals and quoted identifiers become a single `Literal` token so
/// terminators or placeholders inside them are never seen. An unterminated literal runs to the
/// end of the input and is left for the engine to reject.
pub(crate) fn tokenize(sql: &str) -> Vec<Token> {
    let bytes = sql.as_bytes();
    let mut tokens = Vec::new();
    let mut state = State::Normal;
    let mut literal_start = 0;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => {
                if let Some(close) = quote_closer(b) {
                    state = State::Quoted(close);
                    literal_start = idx;
                } else if is_line_comment_start(bytes, idx) {
                    state = State::LineComment;
                    idx += 1;
                } else if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment;
                    idx += 1;
                } else if b == b';' {
                    tokens.push(Token::new(TokenKind::Semicolon, idx, idx + 1));
                } else if b == b'(' {
                    tokens.push(Token::new(TokenKind::OpenParen, idx, idx + 1));
                } else if b == b')' {
                    tokens.push(Token::new(TokenKind::CloseParen, idx, idx + 1));
                } else if b == b'?' {
                    let end = scan_digits(bytes, idx + 1);
                    let placeholder = if end == idx + 1 {
                        Placeholder::Anonymous
                    } else {
                        Placeholder::Numbered(sql[idx + 1..end].parse().unwrap_or(usize::MAX))
                    };
                    tokens.push(Token::new(TokenKind::Placeholder(placeholder), idx, end));
                    idx = end - 1;
                } else if matches!(b, b':' | b'@' | b'$')
                    && bytes.get(idx + 1).is_some_and(|next| is_word_start(*next))
                {
                    let end = scan_word(bytes, idx + 1);
                    let name = sql[idx..end].to_string();
                    tokens.push(Token::new(
                        TokenKind::Placeholder(Placeholder::Named(name)),
                        idx,
                        end,
                    ));
                    idx = end - 1;
                } else if is_word_start(b) {
                    let end = scan_word(bytes, idx);
                    tokens.push(Token::new(TokenKind::Word, idx, end));
                    idx = end - 1;
                } else if b.is_ascii_digit() {
                    let end = scan_number(bytes, idx);
                    tokens.push(Token::new(TokenKind::Other, idx, end));
                    idx = end - 1;
                } else if !b.is_ascii_whitespace() {
                    tokens.push(Token::new(TokenKind::Other, idx, idx + 1));
                }
            }
            State::Quoted(close) => {
                if b == close {
                    if close != b']' && bytes.get(idx + 1) == Some(&close) {
                        idx += 1; // skip escaped quote
                    } else {
                        tokens.push(Token::new(TokenKind::Literal, literal_start, idx + 1));
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment => {
                if is_block_comment_end(bytes, idx) {
                    state = State::Normal;
                    idx += 1;
                }
            }
        }
        idx += 1;
    }

    if let State::Quoted(_) = state {
        tokens.push(Token::new(TokenKind::Literal, literal_start, bytes.len()));
    }

    tokens
}

fn scan_digits(bytes: &[u8], start: usize) -> usize {
    let mut idx = start;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(sql: &str) -> Vec<TokenKind> {
        tokenize(sql).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn placeholders_are_recognised() {
        let placeholders: Vec<Placeholder> = tokenize("SELECT ?, ?3, :name, @x, $y FROM t")
            .into_iter()
            .filter_map(|t| match t.kind {
                TokenKind::Placeholder(p) => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(
            placeholders,
            vec![
                Placeholder::Anonymous,
                Placeholder::Numbered(3),
                Placeholder::Named(":name".into()),
                Placeholder::Named("@x".into()),
                Placeholder::Named("$y".into()),
            ]
        );
    }

    #[test]
    fn literals_hide_terminators_and_placeholders() {
        let sql = "SELECT 'a;?', \"b;c\", [d;e], `f;g`, X'00ff' -- ?; \n/* ; ? */";
        let kinds = kinds(sql);
        assert!(!kinds.contains(&TokenKind::Semicolon));
        assert!(
            !kinds
                .iter()
                .any(|k| matches!(k, TokenKind::Placeholder(_)))
        );
    }

    #[test]
    fn escaped_quotes_stay_inside_literal() {
        let sql = "SELECT 'it''s;fine';";
        let tokens = tokenize(sql);
        assert_eq!(tokens[1].text(sql), "'it''s;fine'");
        assert_eq!(tokens[2].kind, TokenKind::Semicolon);
    }

    #[test]
    fn unterminated_literal_runs_to_end() {
        let sql = "SELECT 'oops; SELECT 1";
        let tokens = tokenize(sql);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1].text(sql), "'oops; SELECT 1");
    }

    #[test]
    fn huge_numbered_placeholder_saturates() {
        let tokens = tokenize("SELECT ?99999999999999999999999");
        assert_eq!(
            tokens[1].kind,
            TokenKind::Placeholder(Placeholder::Numbered(usize::MAX))
        );
    }
}
