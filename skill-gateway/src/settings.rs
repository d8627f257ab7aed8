//! Command line and startup configuration.
//!
//! Everything here runs before the listener is bound: a proxy that cannot
//! load its credentials never starts serving.

use std::path::{Path, PathBuf};

use clap::Parser;
use skill_core::{ConfigError, KeyValues};
use skill_vendors::{Loaded, SetupError, SkillKind};

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "SKILL_PROXY_CONFIG";

/// Directory under the platform config dir holding one file per skill.
pub const CONFIG_DIR: &str = "skill-proxies";

/// Local HTTP proxy that turns `{category, action, params}` requests into
/// vendor API calls.
#[derive(Debug, Parser)]
#[command(name = "skill-gateway", version)]
pub struct Cli {
    /// Skill to serve: linear, slack, notion or supabase.
    pub skill: SkillKind,

    /// Config file. Defaults to `<config dir>/skill-proxies/<skill>.toml`.
    #[arg(long, env = CONFIG_ENV)]
    pub config: Option<PathBuf>,

    /// Listen port on 127.0.0.1. Overrides `port` in the config file.
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StartupError {
    #[error("no platform config directory; pass --config or set {}", CONFIG_ENV)]
    NoConfigDir,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Setup(#[from] SetupError),
}

/// A skill ready to serve.
#[derive(Debug)]
pub struct Settings {
    pub kind: SkillKind,
    pub config_path: PathBuf,
    pub port: u16,
    pub loaded: Loaded,
}

/// Default config file for `kind` under `base`.
#[must_use]
pub fn default_config_path(base: &Path, kind: SkillKind) -> PathBuf {
    base.join(CONFIG_DIR).join(format!("{}.toml", kind.name()))
}

impl Cli {
    /// The config file to read: `--config`, then the env variable, then the
    /// platform default.
    ///
    /// # Errors
    /// [`StartupError::NoConfigDir`] when no path is given and the platform
    /// has no config directory.
    pub fn config_path(&self) -> Result<PathBuf, StartupError> {
        if let Some(path) = &self.config {
            return Ok(path.clone());
        }
        dirs::config_dir()
            .map(|base| default_config_path(&base, self.skill))
            .ok_or(StartupError::NoConfigDir)
    }
}

impl Settings {
    /// Reads, validates and builds the skill named on the command line.
    ///
    /// # Errors
    /// Any [`StartupError`]; configuration problems are reported together.
    pub fn resolve(cli: &Cli) -> Result<Self, StartupError> {
        let config_path = cli.config_path()?;
        let values = KeyValues::load(&config_path)?;
        Self::from_values(cli, config_path, &values)
    }

    /// Builds settings from already parsed values.
    ///
    /// # Errors
    /// [`StartupError::Setup`] when the values do not configure the skill.
    pub fn from_values(cli: &Cli, config_path: PathBuf, values: &KeyValues) -> Result<Self, StartupError> {
        let loaded = skill_vendors::load(cli.skill, values)?;
        let port = cli.port.or(loaded.port).unwrap_or_else(|| cli.skill.default_port());
        Ok(Self { kind: cli.skill, config_path, port, loaded })
    }
}

/// Startup failure text: the error, then how to fix it.
#[must_use]
pub fn remediation(kind: SkillKind, path: Option<&Path>, err: &StartupError) -> String {
    let target = path.map_or_else(
        || format!("<config dir>/{CONFIG_DIR}/{kind}.toml"),
        |p| p.display().to_string(),
    );
    format!(
        "skill-gateway: {err}\n\n\
         Create {target} with at least:\n\n{}\n\
         or point --config / {CONFIG_ENV} at an existing file.",
        kind.example_config()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        match Cli::try_parse_from(std::iter::once("skill-gateway").chain(args.iter().copied())) {
            Ok(c) => c,
            Err(e) => panic!("argument parsing failed: {e}"),
        }
    }

    #[test]
    fn skill_argument_is_required_and_closed() {
        assert!(Cli::try_parse_from(["skill-gateway"]).is_err());
        assert!(Cli::try_parse_from(["skill-gateway", "jira"]).is_err());
        assert_eq!(cli(&["notion"]).skill, SkillKind::Notion);
    }

    #[test]
    fn explicit_config_path_wins() {
        let c = cli(&["linear", "--config", "/tmp/linear.toml"]);
        match c.config_path() {
            Ok(p) => assert_eq!(p, PathBuf::from("/tmp/linear.toml")),
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn default_path_is_per_skill() {
        let path = default_config_path(Path::new("/home/u/.config"), SkillKind::Slack);
        assert_eq!(path, PathBuf::from("/home/u/.config/skill-proxies/slack.toml"));
    }

    #[test]
    fn port_comes_from_flag_then_file_then_default() {
        let path = PathBuf::from("linear.toml");
        let with_port = KeyValues::from_pairs([("api_key", "lin_api_abc123"), ("port", "4100")]);
        let without_port = KeyValues::from_pairs([("api_key", "lin_api_abc123")]);

        let flagged = cli(&["linear", "--port", "4200"]);
        let port = |c: &Cli, v: &KeyValues| match Settings::from_values(c, path.clone(), v) {
            Ok(s) => s.port,
            Err(e) => panic!("settings failed: {e}"),
        };
        assert_eq!(port(&flagged, &with_port), 4200);
        assert_eq!(port(&cli(&["linear"]), &with_port), 4100);
        assert_eq!(port(&cli(&["linear"]), &without_port), 3101);
    }

    #[test]
    fn missing_file_fails_before_anything_is_built() {
        let c = cli(&["notion", "--config", "/definitely/not/here/notion.toml"]);
        match Settings::resolve(&c) {
            Err(StartupError::Config(ConfigError::Read { .. })) => {}
            other => panic!("expected read error, got {other:?}"),
        }
    }

    #[test]
    fn remediation_shows_an_example_config() {
        let err = StartupError::NoConfigDir;
        let text = remediation(SkillKind::Linear, None, &err);
        assert!(text.contains("skill-proxies/linear.toml"));
        assert!(text.contains("api_key = "));
        assert!(text.contains(CONFIG_ENV));
    }
}
