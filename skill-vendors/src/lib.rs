//! Vendor adapters for the skill proxies.
//!
//! Each module implements [`skill_core::Skill`] for one SaaS API: a static
//! command table, typed commands, and an executor that talks to the vendor
//! through a [`VendorTransport`] and flattens the reply.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

mod error;
mod flatten;
mod http;
mod transport;

pub mod linear;
pub mod notion;
pub mod slack;
pub mod supabase;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use skill_core::config::fingerprint;
use skill_core::{KeyValues, Proxy};

pub use error::SetupError;
pub use http::HttpTransport;
#[cfg(any(test, feature = "testing"))]
pub use transport::RecordingTransport;
pub use transport::{Method, VendorRequest, VendorTransport};

/// The supported vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkillKind {
    Linear,
    Slack,
    Notion,
    Supabase,
}

impl SkillKind {
    pub const ALL: [Self; 4] = [Self::Linear, Self::Slack, Self::Notion, Self::Supabase];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => linear::NAME,
            Self::Slack => slack::NAME,
            Self::Notion => notion::NAME,
            Self::Supabase => supabase::NAME,
        }
    }

    /// Port used when neither the command line nor the config sets one.
    #[must_use]
    pub fn default_port(self) -> u16 {
        match self {
            Self::Linear => linear::DEFAULT_PORT,
            Self::Slack => slack::DEFAULT_PORT,
            Self::Notion => notion::DEFAULT_PORT,
            Self::Supabase => supabase::DEFAULT_PORT,
        }
    }

    /// A minimal config file for this skill, shown when loading fails.
    #[must_use]
    pub fn example_config(self) -> &'static str {
        match self {
            Self::Linear => "api_key = \"lin_api_...\"\n",
            Self::Slack => "bot_token = \"xoxb-...\"\n# user_token = \"xoxp-...\"  # enables search messages\n",
            Self::Notion => "api_key = \"ntn_...\"\n",
            Self::Supabase => {
                "url = \"https://<project-ref>.supabase.co\"\nservice_role_key = \"...\"\n\
                 # access_token = \"sbp_...\"  # enables sql query\n"
            }
        }
    }
}

impl fmt::Display for SkillKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SkillKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|k| k.name()).collect();
                format!("unknown skill '{s}'; expected one of: {}", names.join(", "))
            })
    }
}

/// A skill built from its configuration file.
pub struct Loaded {
    pub proxy: Arc<dyn Proxy>,
    /// `port` from the config file, if set.
    pub port: Option<u16>,
    /// `(key, fingerprint)` for every configured credential.
    pub credentials: Vec<(&'static str, String)>,
}

impl fmt::Debug for Loaded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loaded")
            .field("skill", &self.proxy.name())
            .field("port", &self.port)
            .field("credentials", &self.credentials)
            .finish()
    }
}

/// Validates `values` for `kind` and builds the skill with HTTP transports.
///
/// # Errors
/// Returns [`SetupError::Config`] listing every configuration problem, or a
/// client construction error.
pub fn load(kind: SkillKind, values: &KeyValues) -> Result<Loaded, SetupError> {
    let loaded = match kind {
        SkillKind::Linear => {
            let config = linear::LinearConfig::from_values(values)?;
            Loaded {
                credentials: vec![("api_key", fingerprint(&config.api_key))],
                port: config.port,
                proxy: Arc::new(linear::LinearSkill::from_config(&config)?),
            }
        }
        SkillKind::Slack => {
            let config = slack::SlackConfig::from_values(values)?;
            let mut credentials = vec![("bot_token", fingerprint(&config.bot_token))];
            if let Some(token) = &config.user_token {
                credentials.push(("user_token", fingerprint(token)));
            }
            Loaded { credentials, port: config.port, proxy: Arc::new(slack::SlackSkill::from_config(&config)?) }
        }
        SkillKind::Notion => {
            let config = notion::NotionConfig::from_values(values)?;
            Loaded {
                credentials: vec![("api_key", fingerprint(&config.api_key))],
                port: config.port,
                proxy: Arc::new(notion::NotionSkill::from_config(&config)?),
            }
        }
        SkillKind::Supabase => {
            let config = supabase::SupabaseConfig::from_values(values)?;
            let mut credentials = vec![("service_role_key", fingerprint(&config.service_role_key))];
            if let Some(token) = &config.access_token {
                credentials.push(("access_token", fingerprint(token)));
            }
            Loaded {
                credentials,
                port: config.port,
                proxy: Arc::new(supabase::SupabaseSkill::from_config(&config)?),
            }
        }
    };
    Ok(loaded)
}
