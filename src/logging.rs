//! Logging configuration for the shell.
//!
//! Installs a `tracing` subscriber whose filter can be replaced at runtime, so
//! the `debug` command can switch the `cli` and `ovsdb` targets on and off.

use std::collections::BTreeSet;
use std::fmt;
use std::fs::{self, File};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt as tracing_fmt, reload, EnvFilter, Registry};

use crate::config::LogConfig;
use crate::error::{CliError, Result};

/// Targets the `debug` command can enable.
pub const DEBUG_KEYS: [&str; 2] = ["cli", "ovsdb"];

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Debug targets currently enabled, and the filter they are layered on.
#[derive(Default)]
pub struct DebugKeys {
    enabled: BTreeSet<String>,
    base: String,
    handle: Option<FilterHandle>,
}

impl fmt::Debug for DebugKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugKeys")
            .field("enabled", &self.enabled)
            .field("base", &self.base)
            .field("reloadable", &self.handle.is_some())
            .finish()
    }
}

impl DebugKeys {
    /// Creates a set that is not attached to any subscriber.
    pub fn detached(base: impl Into<String>) -> Self {
        Self {
            enabled: BTreeSet::new(),
            base: base.into(),
            handle: None,
        }
    }

    /// True if `key` names a known debug target.
    pub fn is_valid(key: &str) -> bool {
        DEBUG_KEYS.contains(&key)
    }

    pub fn is_enabled(&self, key: &str) -> bool {
        self.enabled.contains(key)
    }

    /// Enabled keys, sorted.
    pub fn enabled(&self) -> impl Iterator<Item = &str> {
        self.enabled.iter().map(String::as_str)
    }

    pub fn enable(&mut self, key: &str) -> Result<()> {
        if !Self::is_valid(key) {
            return Err(CliError::bad_option(key));
        }
        self.enabled.insert(key.to_string());
        self.apply()
    }

    pub fn disable(&mut self, key: &str) -> Result<()> {
        if !Self::is_valid(key) {
            return Err(CliError::bad_option(key));
        }
        self.enabled.remove(key);
        self.apply()
    }

    /// The filter directives in effect: the base filter plus one
    /// `key=debug` directive per enabled key.
    pub fn directives(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if !self.base.is_empty() {
            parts.push(self.base.clone());
        }
        parts.extend(self.enabled.iter().map(|k| format!("{k}=debug")));
        parts.join(",")
    }

    fn apply(&self) -> Result<()> {
        let Some(handle) = &self.handle else {
            return Ok(());
        };
        let filter = EnvFilter::try_new(self.directives())
            .map_err(|e| CliError::config(format!("invalid log filter: {e}")))?;
        handle
            .reload(filter)
            .map_err(|e| CliError::config(format!("cannot reload log filter: {e}")))
    }
}

/// Installs the global subscriber.
///
/// `RUST_LOG` overrides the configured base filter. Logs go to `file` when
/// given, otherwise to stderr.
pub fn init(settings: &LogConfig, file: Option<&Path>) -> Result<DebugKeys> {
    let base = std::env::var("RUST_LOG").unwrap_or_else(|_| settings.filter.clone());
    let filter = EnvFilter::try_new(&base)
        .map_err(|e| CliError::config(format!("invalid log filter '{base}': {e}")))?;
    let (filter, handle) = reload::Layer::new(filter);

    let installed = match file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    CliError::config(format!("cannot create log directory: {e}"))
                })?;
            }
            let log_file = File::create(path)
                .map_err(|e| CliError::config(format!("cannot create log file: {e}")))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_fmt::layer()
                        .with_writer(Mutex::new(log_file))
                        .with_ansi(false),
                )
                .try_init()
        }
        None => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };
    installed.map_err(|e| CliError::config(format!("cannot install logger: {e}")))?;

    Ok(DebugKeys {
        enabled: BTreeSet::new(),
        base,
        handle: Some(handle),
    })
}
