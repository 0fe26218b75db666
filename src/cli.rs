//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;
use crate::logging::DEBUG_KEYS;

/// Modal configuration shell for OpenSwitch devices.
#[derive(Parser, Debug)]
#[command(name = "opscli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Database server: tcp:HOST:PORT or unix:PATH
    #[arg(value_name = "SERVER", env = "OPSCLI_SERVER")]
    pub server: Option<String>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Use an in-memory database instead of a server
    #[arg(long)]
    pub mock_db: bool,

    /// Run without the line editor, reading commands from --command or stdin
    #[arg(long)]
    pub headless: bool,

    /// Command to run (repeatable); implies --headless
    #[arg(short = 'c', long = "command", value_name = "LINE")]
    pub commands: Vec<String>,

    /// Enable a debug target at startup (repeatable)
    #[arg(long = "debug", value_name = "KEY", value_parser = clap::builder::PossibleValuesParser::new(DEBUG_KEYS))]
    pub debug: Vec<String>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path, using default if not specified.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// True when no interactive editor should be used.
    pub fn is_headless(&self) -> bool {
        self.headless || !self.commands.is_empty()
    }

    /// Applies command-line overrides on top of the file settings.
    pub fn apply(&self, config: &mut Config) {
        if let Some(server) = &self.server {
            config.server.address = server.clone();
        }
        if let Some(file) = &self.log_file {
            config.log.file = Some(file.clone());
        }
    }
}
