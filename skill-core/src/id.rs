//! Identifier parsers.
//!
//! Every parser accepts the surface forms a client may reasonably send and
//! returns exactly one canonical form, which is what adapters forward to the
//! vendor. Existence is never checked here.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static ISSUE_KEY: LazyLock<Regex> = LazyLock::new(|| compile(r"^[A-Za-z][A-Za-z0-9]{0,9}-[1-9][0-9]{0,8}$"));
static TEAM_KEY: LazyLock<Regex> = LazyLock::new(|| compile(r"^[A-Za-z][A-Za-z0-9]{0,9}$"));
static EMBEDDED_UUID: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"[0-9a-fA-F]{8}-?[0-9a-fA-F]{4}-?[0-9a-fA-F]{4}-?[0-9a-fA-F]{4}-?[0-9a-fA-F]{12}")
});
static SLACK_CHANNEL: LazyLock<Regex> = LazyLock::new(|| compile(r"^[CGDcgd][A-Za-z0-9]{8,}$"));
static SLACK_CHANNEL_MENTION: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^<#([A-Za-z0-9]+)(?:\|[^>]*)?>$"));
static SLACK_USER: LazyLock<Regex> = LazyLock::new(|| compile(r"^[UWuw][A-Za-z0-9]{8,}$"));
static SLACK_USER_MENTION: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^<@([A-Za-z0-9]+)(?:\|[^>]*)?>$"));
static SLACK_TS: LazyLock<Regex> = LazyLock::new(|| compile(r"^[0-9]{10}\.[0-9]{6}$"));
static SLACK_PERMALINK_TS: LazyLock<Regex> = LazyLock::new(|| compile(r"^p([0-9]{10})([0-9]{6})$"));
static SQL_IDENT: LazyLock<Regex> = LazyLock::new(|| compile(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$"));
static EMAIL: LazyLock<Regex> = LazyLock::new(|| compile(r"^[^@\s]+@[^@\s]+\.[^@\s]+$"));
static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| compile(r"^#[0-9a-fA-F]{6}$"));

#[expect(clippy::expect_used, reason = "patterns are compile-time constants")]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static identifier pattern must compile")
}

/// Parses a UUID given as dashed, 32-hex, braced or `urn:uuid:` text, or
/// embedded in a URL such as a Notion page link.
///
/// Returns the lowercase hyphenated form.
///
/// # Errors
/// Returns a reason string when no UUID can be found.
pub fn uuid(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if let Ok(parsed) = Uuid::try_parse(trimmed) {
        return Ok(parsed.hyphenated().to_string());
    }
    if trimmed.contains('/') {
        // Query strings carry view ids; only the path names the resource.
        let path = trimmed.split(['?', '#']).next().unwrap_or_default();
        if let Some(found) = EMBEDDED_UUID.find_iter(path).last() {
            if let Ok(parsed) = Uuid::try_parse(found.as_str()) {
                return Ok(parsed.hyphenated().to_string());
            }
        }
    }
    Err("must be a UUID (dashed or 32 hex characters) or a URL containing one".to_owned())
}

/// A human issue key such as `ENG-123`, stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub struct IssueKey(pub String);

impl IssueKey {
    /// Parses an issue key in any letter case.
    ///
    /// # Errors
    /// Returns a reason string when the text is not `TEAM-NUMBER`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let trimmed = raw.trim();
        if ISSUE_KEY.is_match(trimmed) {
            Ok(Self(trimmed.to_ascii_uppercase()))
        } else {
            Err("must be an issue key like ENG-123".to_owned())
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An issue named either by its UUID or by its human key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum IssueRef {
    /// Canonical lowercase hyphenated UUID.
    Id(String),
    /// Canonical uppercase key.
    Key(IssueKey),
}

impl IssueRef {
    /// Parses either surface form.
    ///
    /// # Errors
    /// Returns a reason string when the text is neither a UUID nor a key.
    pub fn parse(raw: &str) -> Result<Self, String> {
        if let Ok(id) = uuid(raw) {
            return Ok(Self::Id(id));
        }
        IssueKey::parse(raw)
            .map(Self::Key)
            .map_err(|_| "must be an issue UUID or an issue key like ENG-123".to_owned())
    }

    /// The value forwarded to the vendor, which accepts either form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Id(id) => id,
            Self::Key(key) => key.as_str(),
        }
    }
}

impl Default for IssueRef {
    fn default() -> Self {
        Self::Id(String::new())
    }
}

impl fmt::Display for IssueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a team reference: UUID, or a short team key such as `ENG`.
///
/// # Errors
/// Returns a reason string when the text is neither.
pub fn team_ref(raw: &str) -> Result<String, String> {
    if let Ok(id) = uuid(raw) {
        return Ok(id);
    }
    let trimmed = raw.trim();
    if TEAM_KEY.is_match(trimmed) {
        Ok(trimmed.to_ascii_uppercase())
    } else {
        Err("must be a team UUID or a team key like ENG".to_owned())
    }
}

/// Parses a Slack conversation ID, bare or in `<#C0123|name>` mention form.
///
/// # Errors
/// Returns a reason string for anything else.
pub fn slack_channel(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    let candidate = SLACK_CHANNEL_MENTION
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map_or(trimmed, |m| m.as_str());
    if SLACK_CHANNEL.is_match(candidate) {
        Ok(candidate.to_ascii_uppercase())
    } else {
        Err("must be a channel ID like C0123456789 or <#C0123456789|name>".to_owned())
    }
}

/// Parses a Slack user ID, bare or in `<@U0123>` mention form.
///
/// # Errors
/// Returns a reason string for anything else.
pub fn slack_user(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    let candidate = SLACK_USER_MENTION
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map_or(trimmed, |m| m.as_str());
    if SLACK_USER.is_match(candidate) {
        Ok(candidate.to_ascii_uppercase())
    } else {
        Err("must be a user ID like U0123456789 or <@U0123456789>".to_owned())
    }
}

/// Parses a Slack message timestamp, dotted or in permalink `p…` form.
///
/// # Errors
/// Returns a reason string for anything else.
pub fn slack_ts(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if SLACK_TS.is_match(trimmed) {
        return Ok(trimmed.to_owned());
    }
    if let Some(caps) = SLACK_PERMALINK_TS.captures(trimmed) {
        if let (Some(secs), Some(micros)) = (caps.get(1), caps.get(2)) {
            return Ok(format!("{}.{}", secs.as_str(), micros.as_str()));
        }
    }
    Err("must be a message timestamp like 1700000000.123456 or p1700000000123456".to_owned())
}

/// Validates a bare SQL identifier (table, column, schema or function name).
///
/// # Errors
/// Returns a reason string when the identifier would need quoting.
pub fn sql_ident(raw: &str) -> Result<String, String> {
    if SQL_IDENT.is_match(raw) {
        Ok(raw.to_owned())
    } else {
        Err("must be a SQL identifier (letters, digits, underscore; not starting with a digit)".to_owned())
    }
}

/// Validates an email address shape.
///
/// # Errors
/// Returns a reason string when the shape is wrong.
pub fn email(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if EMAIL.is_match(trimmed) {
        Ok(trimmed.to_owned())
    } else {
        Err("must be an email address".to_owned())
    }
}

/// Validates a `#rrggbb` color, returned lowercase.
///
/// # Errors
/// Returns a reason string when the shape is wrong.
pub fn hex_color(raw: &str) -> Result<String, String> {
    if HEX_COLOR.is_match(raw) {
        Ok(raw.to_ascii_lowercase())
    } else {
        Err("must be a hex color like #5e6ad2".to_owned())
    }
}
