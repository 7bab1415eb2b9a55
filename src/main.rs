mod cli;
mod commands;
mod config;
mod error;
mod json;
mod logging;
mod mcp;
mod outline;
mod pdf;
mod target;
mod ui;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use logging::LogSink;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    // The editor owns the terminal, so its logs go to a file or nowhere.
    let sink = match cli.command {
        Commands::Edit { .. } => LogSink::FileOnly(config.log.file.as_deref()),
        _ => LogSink::Stderr,
    };
    logging::init(cli.verbose, &config.log, sink)?;

    match cli.command {
        Commands::Mcp => {
            mcp::run_server().await?;
        }
        Commands::Edit { path } => {
            commands::edit::run(&path, config)?;
        }
        Commands::Show { path } => {
            commands::show::run(&path)?;
        }
        Commands::Export { path, output } => {
            commands::export::run(&path, output, &config)?;
        }
        Commands::Import { path, json, output } => {
            commands::import::run(&path, &json, output)?;
        }
    }

    Ok(())
}
