use std::sync::Arc;

use anyhow::{Context, Result};
use campus_nav_cli::app::{App, StdoutConsole};
use campus_nav_cli::cli::Cli;
use campus_nav_cli::commands::HELP_TEXT;
use campus_nav_cli::config::{self, DEFAULT_LOG_FILTER, LOG_ENV_VAR};
use campus_nav_cli::providers;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    runtime.block_on(run(cli))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run(cli: Cli) -> Result<()> {
    let resolved = config::resolve_from_env(cli.overrides()).map_err(anyhow::Error::msg)?;
    let backend = providers::backend_from_env(cli.mock, resolved.api, cli.location())
        .map_err(anyhow::Error::msg)
        .context("failed to set up backend")?;

    let mut app = App::new(backend, resolved.recalculation, Arc::new(StdoutConsole));
    app.start();
    println!("{HELP_TEXT}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while !app.should_exit() {
        tokio::select! {
            line = lines.next_line() => match line.context("failed to read stdin")? {
                Some(line) => app.on_line(&line),
                None => break,
            },
            _ = app.step() => {}
        }
    }

    app.shutdown();
    Ok(())
}
