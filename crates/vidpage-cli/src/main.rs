//! vidpage CLI - cached, page-numbered browsing of channel and playlist videos
//!
//! This is the main entry point for the vidpage command-line interface.
//! Command implementations live in [`commands`]; this file only parses
//! arguments, sets up logging and dispatches.

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod output;
mod utils;

use cli::{Cli, Commands};
use utils::logging::initialize_logging;
use utils::settings::load_config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_logging(&cli)?;

    execute_command(cli).await
}

async fn execute_command(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref(), cli.data_dir.as_deref())?;

    match cli.command {
        Commands::Fetch(args) => {
            commands::fetch::execute(args, &config).await?;
        },
        Commands::Clear { source_id } => {
            commands::clear::execute(&source_id, &config).await?;
        },
        Commands::Sweep => {
            commands::sweep::execute(&config).await?;
        },
        Commands::Config { path } => {
            commands::config::execute(&config, cli.config.as_deref(), path)?;
        },
    }

    Ok(())
}
