//! opscli - modal configuration shell for OpenSwitch devices.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::BufReader;
use tracing::{debug, error, info};

use ops_cli::cli::Cli;
use ops_cli::commands::{register_builtin, CommandRouter, Registry};
use ops_cli::config::Config;
use ops_cli::db::{self, DatabaseClient, MockDatabaseClient};
use ops_cli::{logging, shell};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    let config_path = cli.config_path();
    let mut config = Config::load_from_file(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    cli.apply(&mut config);
    config.validate()?;

    let mut debug_keys = logging::init(&config.log, config.log.file.as_deref())?;
    for key in &cli.debug {
        debug_keys.enable(key)?;
    }
    info!("Loaded config from: {}", config_path.display());

    let mut registry = Registry::new();
    register_builtin(&mut registry).context("building command trees")?;
    if debug_keys.is_enabled("cli") {
        for line in registry.dump() {
            debug!(target: "cli", "{line}");
        }
    }

    let client: Arc<dyn DatabaseClient> = if cli.mock_db {
        Arc::new(MockDatabaseClient::new())
    } else {
        Arc::new(db::connect(&config.server)?)
    };
    let hostname = client
        .hostname()
        .await
        .context("reading hostname from the configuration database")?
        .unwrap_or_else(|| config.shell.hostname.clone());
    info!(hostname = %hostname, mock = cli.mock_db, "connected");

    let mut router = CommandRouter::new(registry, client, debug_keys, hostname);
    if !cli.is_headless() {
        shell::run_interactive(&mut router, &config.shell).await?;
    } else if cli.commands.is_empty() {
        let stdin = BufReader::new(tokio::io::stdin());
        shell::headless::run(&mut router, stdin, tokio::io::stdout()).await?;
    } else {
        let script = cli.commands.join("\n");
        shell::headless::run(&mut router, script.as_bytes(), tokio::io::stdout()).await?;
    }
    Ok(())
}
