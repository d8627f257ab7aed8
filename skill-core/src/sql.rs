//! Read-only query classifier for the raw SQL action path.
//!
//! This is a keyword heuristic, not a SQL parser, and it is NOT a security
//! boundary. It over-rejects (a harmless `SELECT` that mentions `update` in a
//! string literal or column name is refused) and a crafted input may slip past
//! it. Database-side privileges remain the real control; this check only keeps
//! obvious mutations away from the read-only path.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Mutation and DDL keywords refused anywhere in the comment-stripped text.
pub const DENIED_KEYWORDS: [&str; 10] = [
    "INSERT", "UPDATE", "DELETE", "DROP", "TRUNCATE", "ALTER", "CREATE", "GRANT", "REVOKE",
    "EXECUTE",
];

static DENIED: LazyLock<Regex> = LazyLock::new(|| {
    compile(&format!(r"(?i)\b({})\b", DENIED_KEYWORDS.join("|")))
});
static LEADING_KEYWORD: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)^(SELECT|WITH)\b"));

#[expect(clippy::expect_used, reason = "patterns are compile-time constants")]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static SQL classifier pattern must compile")
}

/// Why a query was refused by [`check_read_only`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QueryRejection {
    /// Nothing left after stripping comments and whitespace.
    Empty,
    /// The statement does not start with `SELECT` or `WITH`.
    NotSelect,
    /// A `;` was found, which could stack a second statement.
    MultipleStatements,
    /// A denylisted keyword appears as a whole word.
    DeniedKeyword(String),
}

impl fmt::Display for QueryRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "query is empty"),
            Self::NotSelect => write!(f, "query must start with SELECT or WITH"),
            Self::MultipleStatements => write!(f, "semicolons are not allowed"),
            Self::DeniedKeyword(k) => write!(f, "keyword {k} is not allowed"),
        }
    }
}

/// Replaces `--` line comments and `/* */` block comments with a space.
///
/// Text inside `'...'` literals and `"..."` identifiers is kept verbatim, so
/// comment markers there do not hide what follows. An unterminated block
/// comment runs to the end of the input.
#[must_use]
pub fn strip_comments(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    let mut chars = query.chars().peekable();
    let mut quote: Option<char> = None;
    while let Some(c) = chars.next() {
        if let Some(open) = quote {
            out.push(c);
            // a doubled quote closes and reopens, which keeps the literal intact
            if c == open {
                quote = None;
            }
            continue;
        }
        match (c, chars.peek()) {
            ('\'' | '"', _) => {
                quote = Some(c);
                out.push(c);
            }
            ('-', Some('-')) => {
                while chars.next_if(|&n| n != '\n').is_some() {}
                out.push(' ');
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for n in chars.by_ref() {
                    if prev == '*' && n == '/' {
                        break;
                    }
                    prev = n;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

/// Classifies `query` as a single read-only `SELECT`/`WITH` statement.
///
/// Comment markers inside quoted literals are not comments: in
/// `SELECT '--'; DROP TABLE t` the `;` stays visible and the query is
/// refused. A `;` or denylisted word inside a literal is refused too.
///
/// # Errors
/// Returns the first [`QueryRejection`] that applies, checked in order:
/// empty, leading keyword, semicolon, denylisted keyword.
pub fn check_read_only(query: &str) -> Result<(), QueryRejection> {
    let stripped = strip_comments(query);
    let trimmed = stripped.trim();
    if trimmed.is_empty() {
        return Err(QueryRejection::Empty);
    }
    if !LEADING_KEYWORD.is_match(trimmed) {
        return Err(QueryRejection::NotSelect);
    }
    if trimmed.contains(';') {
        return Err(QueryRejection::MultipleStatements);
    }
    if let Some(found) = DENIED.find(trimmed) {
        return Err(QueryRejection::DeniedKeyword(found.as_str().to_ascii_uppercase()));
    }
    Ok(())
}

/// `true` when [`check_read_only`] accepts the query.
#[must_use]
pub fn is_select_query(query: &str) -> bool {
    check_read_only(query).is_ok()
}
