mod cli;
mod commands;
mod report;

use anyhow::Result;
use clap::Parser;
use kvscan_config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Logs go to stderr so stdout stays the human summary
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        cli::Commands::Scan(args) => commands::scan::handle(args, config).await,
        cli::Commands::Tables { store } => commands::tables::handle(store).await,
        cli::Commands::Config { path } => commands::config::handle(&config, cli.config, path),
    }
}
