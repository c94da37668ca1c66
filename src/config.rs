//! Startup configuration.
//!
//! Values come from three layers, highest precedence first: command-line flags, the
//! `DBW_HOST` / `DBW_TOKEN` environment variables, then the TOML config file. The file
//! holds any number of named environments:
//!
//! ```toml
//! default_environment = "dev"
//! refresh_interval = 0
//!
//! [environments.dev]
//! host = "https://dbc-1234.cloud.databricks.com"
//! token = "dapi..."
//! ```
//!
//! Everything is resolved once in `main` into a [`Settings`]; the [`ApiConfig`] part is
//! handed to the API client by reference.

use crate::api::poller::DEFAULT_MAX_IN_FLIGHT;
use crate::cli::Cli;
use color_eyre::eyre::{eyre, Report, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ENVIRONMENT: &str = "dev";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const HOST_ENV_VAR: &str = "DBW_HOST";
pub const TOKEN_ENV_VAR: &str = "DBW_TOKEN";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub default_environment: Option<String>,
    pub refresh_interval: Option<u64>,
    pub max_in_flight: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    pub environments: BTreeMap<String, EnvironmentConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub host: Option<String>,
    pub token: Option<String>,
}

#[derive(Clone)]
pub struct ApiConfig {
    pub environment: String,
    pub host: String,
    pub token: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("environment", &self.environment)
            .field("host", &self.host)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiConfig,
    /// Seconds between automatic refreshes; 0 means refresh only on demand.
    pub refresh_interval: u64,
    pub max_in_flight: usize,
}

impl FileConfig {
    /// `$XDG_CONFIG_HOME/dbw/config.toml`, then `~/.config/dbw/config.toml`, then the
    /// platform config dir.
    pub fn user_config_path() -> Option<PathBuf> {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|s| !s.is_empty()) {
            return Some(PathBuf::from(xdg).join("dbw/config.toml"));
        }
        if let Some(home) = std::env::var_os("HOME") {
            return Some(PathBuf::from(home).join(".config/dbw/config.toml"));
        }
        dirs::config_dir().map(|dir| dir.join("dbw/config.toml"))
    }

    /// A missing file is an empty config; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content)
                .map_err(|e| eyre!("Failed to parse config file {}: {e}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no config file at {}", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(eyre!("Could not read config file {}: {e}", path.display())),
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

fn missing_setting(field: &str, env_var: &str, environment: &str) -> Report {
    eyre!(
        "No {field} configured for environment '{environment}'. \
         Set --{field}, {env_var}, or [environments.{environment}] {field} in the config file."
    )
}

impl Settings {
    pub fn load(cli: &Cli) -> Result<Self> {
        let file = match cli.config.clone().or_else(FileConfig::user_config_path) {
            Some(path) => FileConfig::load(&path)?,
            None => FileConfig::default(),
        };
        Self::resolve(cli, &file, |key| std::env::var(key).ok())
    }

    pub fn resolve(
        cli: &Cli,
        file: &FileConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let environment = cli
            .env
            .clone()
            .or_else(|| file.default_environment.clone())
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());
        let section = file.environments.get(&environment);
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let host = non_empty(cli.host.clone())
            .or_else(|| non_empty(env(HOST_ENV_VAR)))
            .or_else(|| non_empty(section.and_then(|s| s.host.clone())))
            .ok_or_else(|| missing_setting("host", HOST_ENV_VAR, &environment))?;
        let token = non_empty(cli.token.clone())
            .or_else(|| non_empty(env(TOKEN_ENV_VAR)))
            .or_else(|| non_empty(section.and_then(|s| s.token.clone())))
            .ok_or_else(|| missing_setting("token", TOKEN_ENV_VAR, &environment))?;
        if !host.starts_with("http://") && !host.starts_with("https://") {
            return Err(eyre!("Host must start with http:// or https://, got '{host}'"));
        }

        let timeout_secs = cli
            .timeout
            .or(file.request_timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .max(1);

        Ok(Self {
            api: ApiConfig {
                environment,
                host,
                token,
                timeout: Duration::from_secs(timeout_secs),
            },
            refresh_interval: cli.interval.or(file.refresh_interval).unwrap_or(0),
            max_in_flight: cli
                .max_in_flight
                .or(file.max_in_flight)
                .unwrap_or(DEFAULT_MAX_IN_FLIGHT)
                .max(1),
        })
    }
}
