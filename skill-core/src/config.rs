//! Key-value configuration files.
//!
//! Each skill reads one flat TOML file of `key = "value"` pairs that lives
//! outside the code tree. Problems are collected and reported together with
//! remediation text so the process can exit before binding a socket.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Errors raised while loading or checking a configuration file.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The file does not exist or cannot be read.
    #[error("cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a flat TOML table of scalars.
    #[error("config file {} is malformed: {message}", .path.display())]
    Malformed { path: PathBuf, message: String },

    /// Required keys are missing or have the wrong shape.
    #[error("config file {} is incomplete:\n  - {}", .path.display(), .problems.join("\n  - "))]
    Invalid { path: PathBuf, problems: Vec<String> },
}

/// Parsed flat key-value pairs, scalars normalized to strings.
#[derive(Debug, Clone, Default)]
pub struct KeyValues {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl KeyValues {
    /// Reads and parses `path`.
    ///
    /// # Errors
    /// Returns [`ConfigError::Read`] or [`ConfigError::Malformed`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &text)
    }

    /// Parses `text` as if it had been read from `path`.
    ///
    /// # Errors
    /// Returns [`ConfigError::Malformed`] for invalid TOML or nested values.
    pub fn parse(path: &Path, text: &str) -> Result<Self, ConfigError> {
        let malformed = |message: String| ConfigError::Malformed { path: path.to_path_buf(), message };
        let table: toml::Table = text.parse().map_err(|e: toml::de::Error| malformed(e.to_string()))?;
        let mut values = BTreeMap::new();
        for (key, value) in table {
            let scalar = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                other => {
                    return Err(malformed(format!(
                        "key '{key}' must be a string, integer or boolean, found {}",
                        other.type_str()
                    )))
                }
            };
            values.insert(key, scalar);
        }
        Ok(Self { path: path.to_path_buf(), values })
    }

    /// Builds an in-memory set, mainly for tests.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            path: PathBuf::from("<memory>"),
            values: pairs.into_iter().map(|(k, v)| (k.to_owned(), v.to_owned())).collect(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the trimmed value of `key` if present and non-empty.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
    }

    /// Starts a checked read of this file's keys.
    #[must_use]
    pub fn check(&self) -> Checked<'_> {
        Checked { values: self, problems: Vec::new() }
    }
}

/// Accumulates key problems so they can be reported together.
#[derive(Debug)]
pub struct Checked<'a> {
    values: &'a KeyValues,
    problems: Vec<String>,
}

impl Checked<'_> {
    /// A required key whose value passes `validate`.
    ///
    /// Returns an empty string when the key is missing or invalid; the value
    /// is only meaningful after [`Self::finish`] succeeds.
    pub fn required(&mut self, key: &str, validate: impl Fn(&str) -> Result<(), String>) -> String {
        match self.values.get(key) {
            Some(v) => match validate(v) {
                Ok(()) => v.to_owned(),
                Err(reason) => {
                    self.problems.push(format!("{key}: {reason}"));
                    String::new()
                }
            },
            None => {
                self.problems.push(format!("{key}: is required"));
                String::new()
            }
        }
    }

    /// An optional key whose value, when present, passes `validate`.
    pub fn optional(&mut self, key: &str, validate: impl Fn(&str) -> Result<(), String>) -> Option<String> {
        let v = self.values.get(key)?;
        match validate(v) {
            Ok(()) => Some(v.to_owned()),
            Err(reason) => {
                self.problems.push(format!("{key}: {reason}"));
                None
            }
        }
    }

    /// Optional `port` key, restricted to unprivileged ports.
    pub fn port(&mut self) -> Option<u16> {
        let raw = self.values.get("port")?;
        match raw.parse::<u16>() {
            Ok(p) if p >= 1024 => Some(p),
            _ => {
                self.problems.push(format!("port: must be an integer between 1024 and 65535, got '{raw}'"));
                None
            }
        }
    }

    /// Records a problem spanning several keys.
    pub fn problem(&mut self, message: impl Into<String>) {
        self.problems.push(message.into());
    }

    /// Ends the check.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] listing every problem found.
    pub fn finish(self) -> Result<(), ConfigError> {
        if self.problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid { path: self.values.path.clone(), problems: self.problems })
        }
    }
}

/// Validator for keys that must start with one of `prefixes`.
pub fn prefixed(prefixes: &'static [&'static str]) -> impl Fn(&str) -> Result<(), String> {
    move |v| {
        if prefixes.iter().any(|p| v.starts_with(p) && v.len() > p.len()) {
            Ok(())
        } else {
            Err(format!("must start with {}", prefixes.join(" or ")))
        }
    }
}

/// Validator that accepts any non-empty value.
pub fn non_empty(_: &str) -> Result<(), String> {
    Ok(())
}

/// Short SHA-256 fingerprint of a secret, safe to log.
#[must_use]
pub fn fingerprint(secret: &str) -> String {
    let digest = Sha256::digest(secret.as_bytes());
    digest.iter().take(4).fold(String::with_capacity(8), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_scalars() {
        let kv = match KeyValues::parse(Path::new("t.toml"), "api_key = \"lin_api_x\"\nport = 4000\n") {
            Ok(kv) => kv,
            Err(e) => panic!("parse failed: {e}"),
        };
        assert_eq!(kv.get("api_key"), Some("lin_api_x"));
        assert_eq!(kv.get("port"), Some("4000"));
    }

    #[test]
    fn nested_tables_are_malformed() {
        let result = KeyValues::parse(Path::new("t.toml"), "[linear]\napi_key = \"x\"\n");
        assert!(matches!(result, Err(ConfigError::Malformed { .. })));
    }

    #[test]
    fn invalid_toml_is_malformed() {
        let result = KeyValues::parse(Path::new("t.toml"), "api_key = ");
        assert!(matches!(result, Err(ConfigError::Malformed { .. })));
    }

    #[test]
    fn missing_file_is_read_error() {
        let result = KeyValues::load(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn all_problems_are_reported_together() {
        let kv = KeyValues::from_pairs([("api_key", "wrong"), ("port", "80")]);
        let mut c = kv.check();
        let _ = c.required("api_key", prefixed(&["lin_api_"]));
        let _ = c.required("workspace", non_empty);
        let _ = c.port();
        match c.finish() {
            Err(ConfigError::Invalid { problems, .. }) => {
                assert_eq!(problems.len(), 3, "got {problems:?}");
                assert!(problems[0].contains("lin_api_"));
                assert!(problems[1].contains("workspace: is required"));
                assert!(problems[2].starts_with("port:"));
            }
            other => panic!("expected Invalid, got {other:?}"),
        }
    }

    #[test]
    fn blank_values_count_as_missing() {
        let kv = KeyValues::from_pairs([("api_key", "   ")]);
        let mut c = kv.check();
        let _ = c.required("api_key", non_empty);
        assert!(c.finish().is_err());
    }

    #[test]
    fn bare_prefix_is_rejected() {
        assert!(prefixed(&["xoxb-"])("xoxb-").is_err());
        assert!(prefixed(&["xoxb-"])("xoxb-123").is_ok());
    }

    #[test]
    fn fingerprint_is_short_and_stable() {
        let a = fingerprint("lin_api_secret");
        assert_eq!(a.len(), 8);
        assert_eq!(a, fingerprint("lin_api_secret"));
        assert_ne!(a, fingerprint("lin_api_other"));
        assert!(!a.contains("secret"));
    }
}
