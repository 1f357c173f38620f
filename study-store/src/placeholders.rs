//! Placeholder rewriting from `%s` (format style) to PostgreSQL `$n`.
//!
//! The generator writes `%s` for every bound value. PostgreSQL wants `$1`,
//! `$2`, ... in order. Text inside single-quoted literals, double-quoted
//! identifiers and comments is copied verbatim, so `LIKE '%s%'` is left
//! alone. `%%` collapses to a literal `%`. Statements that already use `$n`
//! pass through unchanged; mixing both styles is rejected.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlaceholderError {
    #[error("mixed placeholder styles: both %s and $n present")]
    MixedStyles,
}

/// Result of [`rewrite_placeholders`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub sql: String,
    /// Number of distinct positional parameters the statement expects.
    pub count: usize,
}

#[derive(Clone, Copy)]
enum State {
    Normal,
    Single,
    Double,
    LineComment,
    BlockComment(u32),
}

/// Rewrites `%s` placeholders to `$1..$n`.
///
/// # Errors
/// [`PlaceholderError::MixedStyles`] when `%s` and `$n` appear together.
pub fn rewrite_placeholders(sql: &str) -> Result<Rewritten, PlaceholderError> {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len() + 8);
    let mut state = State::Normal;
    let mut format_count = 0usize;
    let mut native_max = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        match state {
            State::Normal => match (c, next) {
                ('%', Some('s')) => {
                    format_count += 1;
                    out.push('$');
                    out.push_str(&format_count.to_string());
                    i += 2;
                    continue;
                }
                ('%', Some('%')) => {
                    out.push('%');
                    i += 2;
                    continue;
                }
                ('$', Some(d)) if d.is_ascii_digit() && !prev_is_word(&chars, i) => {
                    let start = i + 1;
                    let mut end = start;
                    while end < chars.len() && chars[end].is_ascii_digit() {
                        end += 1;
                    }
                    let n: String = chars[start..end].iter().collect();
                    native_max = native_max.max(n.parse().unwrap_or(0));
                    out.push('$');
                    out.push_str(&n);
                    i = end;
                    continue;
                }
                ('\'', _) => state = State::Single,
                ('"', _) => state = State::Double,
                ('-', Some('-')) => {
                    out.push_str("--");
                    state = State::LineComment;
                    i += 2;
                    continue;
                }
                ('/', Some('*')) => {
                    out.push_str("/*");
                    state = State::BlockComment(1);
                    i += 2;
                    continue;
                }
                _ => {}
            },
            State::Single => {
                if c == '\'' {
                    if next == Some('\'') {
                        out.push_str("''");
                        i += 2;
                        continue;
                    }
                    state = State::Normal;
                }
            }
            State::Double => {
                if c == '"' {
                    state = State::Normal;
                }
            }
            State::LineComment => {
                if c == '\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => match (c, next) {
                ('*', Some('/')) => {
                    out.push_str("*/");
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    i += 2;
                    continue;
                }
                ('/', Some('*')) => {
                    out.push_str("/*");
                    state = State::BlockComment(depth + 1);
                    i += 2;
                    continue;
                }
                _ => {}
            },
        }

        out.push(c);
        i += 1;
    }

    if format_count > 0 && native_max > 0 {
        return Err(PlaceholderError::MixedStyles);
    }

    Ok(Rewritten {
        sql: out,
        count: format_count.max(native_max),
    })
}

fn prev_is_word(chars: &[char], i: usize) -> bool {
    i > 0 && (chars[i - 1].is_alphanumeric() || chars[i - 1] == '_')
}
