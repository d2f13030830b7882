//! Logging configuration.
//!
//! Levels come from `CW_LOG` (or raw `RUST_LOG` directives) and `-v`/`-q`.
//! `CW_LOG_FORMAT=jsonl` or a machine `--format` switches stderr to JSON lines.

use tracing_subscriber::filter::LevelFilter;

/// Where log lines go on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Human,
    Jsonl,
}

impl LogFormat {
    fn from_env_value(value: &str) -> Option<Self> {
        match value.trim() {
            "human" => Some(LogFormat::Human),
            "jsonl" => Some(LogFormat::Jsonl),
            _ => None,
        }
    }
}

/// Level implied by `-v` / `-q` counts; `None` leaves the environment in charge.
pub fn verbosity_level(verbose: u8, quiet: bool) -> Option<LevelFilter> {
    match (quiet, verbose) {
        (true, _) => Some(LevelFilter::ERROR),
        (false, 0) => None,
        (false, 1) => Some(LevelFilter::DEBUG),
        (false, _) => Some(LevelFilter::TRACE),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LevelFilter,
    /// Include timestamps in human output.
    pub timestamps: bool,
    /// Raw `RUST_LOG` directives, used verbatim when no level was chosen.
    pub rust_log: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LevelFilter::INFO,
            timestamps: true,
            rust_log: None,
        }
    }
}

impl LogConfig {
    pub fn from_env(cli_level: Option<LevelFilter>, cli_format: Option<LogFormat>) -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), cli_level, cli_format)
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(
        env: impl Fn(&str) -> Option<String>,
        cli_level: Option<LevelFilter>,
        cli_format: Option<LogFormat>,
    ) -> Self {
        let env_level = env("CW_LOG").and_then(|v| v.trim().parse::<LevelFilter>().ok());
        let rust_log = env("RUST_LOG").filter(|v| !v.trim().is_empty());

        let level = cli_level.or(env_level);
        LogConfig {
            format: cli_format
                .or_else(|| env("CW_LOG_FORMAT").as_deref().and_then(LogFormat::from_env_value))
                .unwrap_or_default(),
            level: level.unwrap_or(LevelFilter::INFO),
            timestamps: true,
            rust_log: if level.is_none() { rust_log } else { None },
        }
    }

    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// `EnvFilter` directives: our crates at `level`, dependencies no louder than warn.
    pub fn filter_directives(&self) -> String {
        if let Some(raw) = &self.rust_log {
            return raw.clone();
        }
        let level = self.level;
        if level == LevelFilter::OFF {
            return "off".to_string();
        }
        let deps = directive(level.min(LevelFilter::WARN));
        let level = directive(level);
        ["cardwatch", "cw_core", "cw_client", "cw_report", "cw_common"]
            .iter()
            .fold(deps, |acc, krate| format!("{acc},{krate}={level}"))
    }
}

fn directive(level: LevelFilter) -> String {
    level.to_string().to_ascii_lowercase()
}
