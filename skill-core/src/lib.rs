//! Shared contract for the skill proxies.
//!
//! Every proxy accepts a `{category, action, params}` envelope, validates it
//! against a closed command table, runs one vendor call and answers with a
//! `{success, data|error}` envelope. This crate holds everything that does not
//! depend on a particular vendor: the envelope types, parameter and identifier
//! parsing, the read-only SQL classifier, the error sanitizer, the dispatch
//! traits and the configuration file reader.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod id;
pub mod params;
pub mod sanitize;
pub mod sql;

pub use config::{ConfigError, KeyValues};
pub use dispatch::{ActionEntry, ActionTable, Proxy, Skill};
pub use envelope::{ActionRequest, ActionResponse, Params};
pub use error::{FieldError, SkillError, VendorError};
pub use params::ParamReader;
pub use sanitize::{Rule, Sanitized, Sanitizer};
pub use sql::{check_read_only, is_select_query, QueryRejection};
