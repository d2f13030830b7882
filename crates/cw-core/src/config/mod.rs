//! Configuration loading for cardwatch.
//!
//! This module handles:
//! - Loading `config.toml` (api, render, and reports sections)
//! - Resolution order (CLI > env > XDG > defaults)
//! - Shape checking via serde and a few semantic checks

use cw_client::DEFAULT_BASE_URL;
use cw_report::RenderConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default XDG config directory name.
const CONFIG_DIR_NAME: &str = "cardwatch";

/// Config file name inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable naming an explicit config file.
pub const ENV_CONFIG: &str = "CARDWATCH_CONFIG";

/// Environment variable overriding the backend base URL.
pub const ENV_API_URL: &str = "CARDWATCH_API_URL";

/// Upper bound for any configured wait, in milliseconds.
pub const MAX_WAIT_MS: u64 = 3_600_000;

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid TOML in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// `[api]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout; none by default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// `[reports]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportsConfig {
    #[serde(default = "default_reports_dir")]
    pub dir: PathBuf,
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from("reports")
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            dir: default_reports_dir(),
        }
    }
}

/// Whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub reports: ReportsConfig,
}

impl Config {
    /// Reject settings no command can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.api.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "api.base_url must start with http:// or https://, got '{}'",
                self.api.base_url
            )));
        }
        if let Some(secs) = self.api.timeout_secs {
            if secs == 0 || secs > MAX_WAIT_MS / 1000 {
                return Err(ConfigError::Invalid(format!(
                    "api.timeout_secs must be between 1 and {}",
                    MAX_WAIT_MS / 1000
                )));
            }
        }
        if self.render.navigation_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "render.navigation_timeout_ms must be positive".to_string(),
            ));
        }
        let render = &self.render;
        for (name, value) in [
            ("navigation_timeout_ms", render.navigation_timeout_ms),
            ("render_timeout_ms", render.render_timeout_ms),
            ("settle_ms", render.settle_ms),
            ("post_render_ms", render.post_render_ms),
        ] {
            if value > MAX_WAIT_MS {
                return Err(ConfigError::Invalid(format!(
                    "render.{name} must be at most {MAX_WAIT_MS}, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Where a resolved setting came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Cli,
    Env,
    File,
    Default,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Cli => "cli",
            Source::Env => "env",
            Source::File => "file",
            Source::Default => "default",
        }
    }
}

/// Resolved configuration with provenance information.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: Config,
    /// Config file that was read, if any.
    pub path: Option<PathBuf>,
    pub base_url_source: Source,
}

/// Configuration resolution options.
#[derive(Debug, Default, Clone)]
pub struct ConfigOptions {
    /// Explicit config file (highest priority).
    pub config_path: Option<PathBuf>,
    /// Explicit backend URL.
    pub api_url: Option<String>,
    /// Explicit request timeout.
    pub timeout_secs: Option<u64>,
}

/// Load configuration with the standard resolution order.
///
/// Resolution order (highest to lowest priority):
/// 1. Explicit CLI flags (via ConfigOptions)
/// 2. Environment variables (CARDWATCH_CONFIG, CARDWATCH_API_URL)
/// 3. XDG config home (~/.config/cardwatch/config.toml)
/// 4. Built-in defaults
pub fn load_config(options: &ConfigOptions) -> Result<ResolvedConfig, ConfigError> {
    load_config_with(options, |key| std::env::var(key).ok())
}

/// [`load_config`] with an explicit environment source.
pub fn load_config_with(
    options: &ConfigOptions,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig, ConfigError> {
    let (mut config, path) = match explicit_config_path(options, &env) {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::NotFound { path });
            }
            (load_config_file(&path)?, Some(path))
        }
        None => {
            let path = default_config_path(&env);
            if path.exists() {
                (load_config_file(&path)?, Some(path))
            } else {
                (Config::default(), None)
            }
        }
    };

    let base_url_source = if let Some(url) = non_blank(options.api_url.clone()) {
        config.api.base_url = url;
        Source::Cli
    } else if let Some(url) = non_blank(env(ENV_API_URL)) {
        config.api.base_url = url;
        Source::Env
    } else if path.is_some() && config.api.base_url != DEFAULT_BASE_URL {
        Source::File
    } else {
        Source::Default
    };

    if let Some(secs) = options.timeout_secs {
        config.api.timeout_secs = Some(secs);
    }

    config.validate()?;
    Ok(ResolvedConfig {
        config,
        path,
        base_url_source,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn explicit_config_path(
    options: &ConfigOptions,
    env: &impl Fn(&str) -> Option<String>,
) -> Option<PathBuf> {
    options
        .config_path
        .clone()
        .or_else(|| non_blank(env(ENV_CONFIG)).map(PathBuf::from))
}

/// `$XDG_CONFIG_HOME/cardwatch/config.toml`, else under `~/.config`.
fn default_config_path(env: &impl Fn(&str) -> Option<String>) -> PathBuf {
    let xdg_config = non_blank(env("XDG_CONFIG_HOME"))
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config")
        });
    xdg_config.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)
}

/// Parse one config file.
pub fn load_config_file(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}
