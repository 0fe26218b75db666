//! Configuration management for the shell.
//!
//! Loads settings from a TOML file. Every field has a default, so a missing
//! file or section yields a working configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CliError, Result};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Database server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Interactive shell settings.
    #[serde(default)]
    pub shell: ShellConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// Where and how to reach the OVSDB server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// `tcp:HOST:PORT` or `unix:PATH`.
    #[serde(default = "default_address")]
    pub address: String,

    /// Database name sent with every transaction.
    #[serde(default = "default_database")]
    pub database: String,

    /// Bound on connect plus read, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_address() -> String {
    "unix:/var/run/openvswitch/db.sock".to_string()
}

fn default_database() -> String {
    "OpenSwitch".to_string()
}

fn default_timeout_ms() -> u64 {
    1000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            database: default_database(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Shell presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShellConfig {
    /// Prompt name used when the database has no hostname.
    #[serde(default = "default_hostname")]
    pub hostname: String,

    /// Banner printed at startup; empty disables it.
    #[serde(default = "default_motd")]
    pub motd: String,

    /// Number of lines kept in the input history.
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

fn default_hostname() -> String {
    "OpenSwitch".to_string()
}

fn default_motd() -> String {
    "OpenSwitch shell".to_string()
}

fn default_history_size() -> usize {
    100
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            motd: default_motd(),
            history_size: default_history_size(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    /// Base `tracing` filter, overridden by `RUST_LOG`.
    #[serde(default = "default_filter")]
    pub filter: String,

    /// Log file; stderr when unset.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_filter() -> String {
    "warn".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            file: None,
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ops-cli")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| CliError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            CliError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values no session could use.
    pub fn validate(&self) -> Result<()> {
        if self.server.timeout_ms == 0 {
            return Err(CliError::config("server.timeout_ms must be positive"));
        }
        if self.server.database.is_empty() {
            return Err(CliError::config("server.database must not be empty"));
        }
        if self.shell.hostname.is_empty() {
            return Err(CliError::config("shell.hostname must not be empty"));
        }
        Ok(())
    }
}
