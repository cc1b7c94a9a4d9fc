//! Splitting command text into statements and rewriting named placeholders.
//!
//! A lightweight state machine skips quoted strings, quoted identifiers, comments and
//! dollar-quoted bodies, so `;`, `@` and `:` inside them are never treated as syntax.

mod lexer;

use lexer::{
    State, closes_block_comment, closes_dollar_tag, dollar_tag_at, is_named_placeholder_start,
    opens_block_comment, opens_line_comment, scan_identifier,
};

/// One statement of a command, ready to send to the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedStatement {
    /// Statement text with named placeholders rewritten to `$n`.
    pub sql: String,
    /// Parameter names in `$n` order; empty when nothing was rewritten.
    pub parameter_names: Vec<String>,
}

/// Split `sql` on top-level `;` and, when `rewrite_named` is set, rewrite `@name` / `:name`
/// placeholders to positional `$n` markers numbered per statement.
///
/// Empty statements are dropped.
///
/// ```rust
/// use spi_bridge::translation::parse_statements;
///
/// let parsed = parse_statements("SELECT @a, @b, @a; SELECT 1", true);
/// assert_eq!(parsed.len(), 2);
/// assert_eq!(parsed[0].sql, "SELECT $1, $2, $1");
/// assert_eq!(parsed[0].parameter_names, vec!["a", "b"]);
/// ```
#[must_use]
pub fn parse_statements(sql: &str, rewrite_named: bool) -> Vec<ParsedStatement> {
    let bytes = sql.as_bytes();
    let mut statements = Vec::new();
    let mut current: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut names: Vec<String> = Vec::new();
    let mut state = State::Normal;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                _ if opens_line_comment(bytes, idx) => state = State::LineComment,
                _ if opens_block_comment(bytes, idx) => {
                    state = State::BlockComment(1);
                    current.extend_from_slice(b"/*");
                    idx += 2;
                    continue;
                }
                b'$' => {
                    if let Some((tag, close)) = dollar_tag_at(bytes, idx) {
                        current.extend_from_slice(&bytes[idx..=close]);
                        state = State::DollarQuoted(tag.to_string());
                        idx = close + 1;
                        continue;
                    }
                }
                b';' => {
                    finish_statement(&mut statements, &mut current, &mut names);
                    idx += 1;
                    continue;
                }
                _ if rewrite_named && is_named_placeholder_start(bytes, idx) => {
                    if let Some((end, name)) = scan_identifier(bytes, idx + 1) {
                        let position = match names.iter().position(|n| n == name) {
                            Some(existing) => existing,
                            None => {
                                names.push(name.to_string());
                                names.len() - 1
                            }
                        };
                        current.push(b'$');
                        current.extend_from_slice((position + 1).to_string().as_bytes());
                        idx = end;
                        continue;
                    }
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        current.push(b);
                        idx += 1; // escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        current.push(b);
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if opens_block_comment(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    current.extend_from_slice(b"/*");
                    idx += 2;
                    continue;
                } else if closes_block_comment(bytes, idx) {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    current.extend_from_slice(b"*/");
                    idx += 2;
                    continue;
                }
            }
            State::DollarQuoted(ref tag) => {
                if closes_dollar_tag(bytes, idx, tag) {
                    let end = idx + 1 + tag.len();
                    current.extend_from_slice(&bytes[idx..=end]);
                    state = State::Normal;
                    idx = end + 1;
                    continue;
                }
            }
        }

        current.push(b);
        idx += 1;
    }

    finish_statement(&mut statements, &mut current, &mut names);
    statements
}

fn finish_statement(
    statements: &mut Vec<ParsedStatement>,
    current: &mut Vec<u8>,
    names: &mut Vec<String>,
) {
    // only whole input bytes and ASCII are ever pushed, and splits happen on ASCII `;`
    let text = String::from_utf8_lossy(current).into_owned();
    current.clear();
    let parameter_names = std::mem::take(names);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return;
    }
    statements.push(ParsedStatement {
        sql: trimmed.to_string(),
        parameter_names,
    });
}
