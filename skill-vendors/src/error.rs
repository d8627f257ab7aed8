//! Errors raised while building a skill from its configuration.

use skill_core::ConfigError;

/// A skill could not be constructed. Always fatal at startup.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SetupError {
    /// The configuration file is missing keys or has malformed values.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A configured value cannot be sent as an HTTP header.
    #[error("header {name} contains characters HTTP does not allow")]
    Header { name: String },

    /// The HTTP client could not be initialized (TLS backend, proxy settings).
    #[error("HTTP client could not be built: {0}")]
    Client(#[from] reqwest::Error),
}
