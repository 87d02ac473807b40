mod cli;
mod commands;
mod ui;

use anyhow::{anyhow, Result};
use clap::Parser;
use daybook::config::Config;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let config = Config::load()?;
    init_tracing(&config.log_filter)?;

    let command = args.command.unwrap_or(cli::Command::Tui);
    match command {
        cli::Command::Init => commands::init(),
        cli::Command::List => commands::list(&config),
        cli::Command::Add { text, tag, rank } => commands::add(&config, text, tag, rank),
        cli::Command::Edit {
            task_id,
            text,
            tag,
            rank,
        } => commands::edit(&config, task_id, text, tag, rank),
        cli::Command::Delete { task_id } => commands::delete(&config, task_id),
        cli::Command::Summary => commands::summary(&config),
        cli::Command::Calendar { month, day } => commands::calendar(&config, month, day),
        cli::Command::Tui => commands::tui(&config),
    }
}

fn init_tracing(default_filter: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("installing log subscriber: {e}"))?;
    Ok(())
}
