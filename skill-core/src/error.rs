use std::fmt;

use crate::sql::QueryRejection;

/// A single parameter that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Parameter name as supplied by the client, e.g. `"teamId"`.
    pub field: String,
    /// Human-readable reason, e.g. `"must be a UUID"`.
    pub reason: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { field: field.into(), reason: reason.into() }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Failures reported by, or while talking to, a vendor API.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum VendorError {
    /// The vendor answered with an error status, an error code, or both.
    #[error("vendor API error (status {status:?}, code {code:?}): {message}")]
    Api {
        status: Option<u16>,
        code: Option<String>,
        message: String,
    },

    /// The request did not complete before the HTTP client gave up.
    #[error("vendor request timed out: {0}")]
    Timeout(String),

    /// The vendor host could not be reached.
    #[error("vendor connection failed: {0}")]
    Connect(String),

    /// The vendor answered with a body this proxy cannot interpret.
    #[error("unexpected vendor response: {0}")]
    Decode(String),
}

impl VendorError {
    /// Shorthand for an [`VendorError::Api`] carrying only a vendor code.
    pub fn code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api { status: None, code: Some(code.into()), message: message.into() }
    }

    /// Shorthand for an [`VendorError::Api`] carrying only an HTTP status.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Api { status: Some(status), code: None, message: message.into() }
    }
}

/// Errors produced while handling one action request.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SkillError {
    /// The category is not part of the skill's action table.
    #[error("Unknown category: {category}. Available categories: {}", .available.join(", "))]
    UnknownCategory {
        category: String,
        available: Vec<&'static str>,
    },

    /// The category exists but has no such action.
    #[error(
        "Unknown action: {action} for category {category}. Available actions: {}",
        .available.join(", ")
    )]
    UnknownAction {
        category: String,
        action: String,
        available: Vec<&'static str>,
    },

    /// One or more parameters failed validation.
    #[error("Invalid parameters: {}", join_fields(.0))]
    InvalidParams(Vec<FieldError>),

    /// A query was refused by the read-only classifier.
    #[error("Only read-only SELECT/WITH queries are allowed: {0}")]
    UnsafeQuery(QueryRejection),

    /// The action is valid but cannot run with the current configuration.
    #[error("{0}")]
    Unavailable(String),

    /// The vendor call failed.
    #[error(transparent)]
    Vendor(#[from] VendorError),
}

impl SkillError {
    /// Shorthand for a single-field validation failure.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParams(vec![FieldError::new(field, reason)])
    }

    /// `true` for failures detected locally, before any vendor call.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Vendor(_))
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}
