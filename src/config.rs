//! Layered configuration for the Estate CRM.
//!
//! Sources, lowest precedence first:
//! - built-in defaults
//! - `estate-crm.toml` in the working directory (or the file given with `--config`)
//! - environment variables (`ESTATE_CRM_*`, including a `.env` file)
//! - command-line flags
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 5000
//! dev_mode = false
//!
//! [database]
//! path = "data/estate-crm.db"
//!
//! [interactions]
//! overdue_days = 20
//!
//! [logging]
//! format = "pretty"
//! ```

use anyhow::{Context, Result};
use estate_common::lifecycle::DEFAULT_OVERDUE_DAYS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::crm::server::ServerConfig;

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "estate-crm.toml";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Invalid log format '{}'. Valid values: pretty, json", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Permissive CORS for a front-end dev server on another port
    #[serde(default)]
    pub dev_mode: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            dev_mode: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSection {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/estate-crm.db")
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionsSection {
    /// Days without an update before an open interaction is overdue
    #[serde(default = "default_overdue_days")]
    pub overdue_days: u32,
}

/// Upper bound on `interactions.overdue_days` (a century).
pub const MAX_OVERDUE_DAYS: u32 = 36_500;

fn default_overdue_days() -> u32 {
    DEFAULT_OVERDUE_DAYS
}

impl Default for InteractionsSection {
    fn default() -> Self {
        Self {
            overdue_days: default_overdue_days(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSection {
    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_format() -> String {
    LogFormat::default().to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            format: default_log_format(),
        }
    }
}

/// Command-line flags that override file and environment settings.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub db_path: Option<PathBuf>,
    pub dev_mode: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrmConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub interactions: InteractionsSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl CrmConfig {
    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse estate-crm.toml")
    }

    /// Load configuration from a TOML file.
    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Resolve file and environment layers.
    ///
    /// An explicit `path` must exist; otherwise `estate-crm.toml` is used when
    /// present in the working directory and defaults apply when it is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::load_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `ESTATE_CRM_*` variables read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(host) = lookup("ESTATE_CRM_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("ESTATE_CRM_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid ESTATE_CRM_PORT '{}'", port))?;
        }
        if let Some(path) = lookup("ESTATE_CRM_DB_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(days) = lookup("ESTATE_CRM_OVERDUE_DAYS") {
            self.interactions.overdue_days = days
                .trim()
                .parse()
                .with_context(|| format!("Invalid ESTATE_CRM_OVERDUE_DAYS '{}'", days))?;
        }
        if let Some(format) = lookup("ESTATE_CRM_LOG_FORMAT") {
            self.logging.format = format;
        }
        Ok(())
    }

    /// Apply command-line flags, the highest-precedence layer.
    pub fn with_overrides(mut self, cli: CliOverrides) -> Self {
        if let Some(host) = cli.host {
            self.server.host = host;
        }
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        if let Some(path) = cli.db_path {
            self.database.path = path;
        }
        if cli.dev_mode {
            self.server.dev_mode = true;
        }
        self
    }

    /// Reject settings the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        if self.server.port == 0 {
            problems.push("server.port must be between 1 and 65535".to_string());
        }
        if !(1..=MAX_OVERDUE_DAYS).contains(&self.interactions.overdue_days) {
            problems.push(format!(
                "interactions.overdue_days must be between 1 and {}",
                MAX_OVERDUE_DAYS
            ));
        }
        if let Err(e) = self.logging.format.parse::<LogFormat>() {
            problems.push(e.to_string());
        }
        if problems.is_empty() {
            Ok(())
        } else {
            anyhow::bail!("Invalid configuration: {}", problems.join("; "))
        }
    }

    /// Parsed log format; falls back to `pretty` for an unknown value.
    pub fn log_format(&self) -> LogFormat {
        self.logging.format.parse().unwrap_or_default()
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.server.host.clone(),
            port: self.server.port,
            db_path: self.database.path.clone(),
            dev_mode: self.server.dev_mode,
            overdue_days: self.interactions.overdue_days,
        }
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}
