use clap::Parser;
use tracing_subscriber::EnvFilter;

mod args;
mod commands;

use args::{Cli, Command};

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let result = match &cli.command {
        Command::Columns(args) => commands::columns::run(&cli, args).await,
        Command::Preview(args) => commands::preview::run(&cli, args).await,
        Command::Insert(args) => commands::insert::run(&cli, args).await,
        Command::Lists(args) => commands::lists::run(&cli, args).await,
        Command::Ping => commands::ping::run(&cli).await,
    };

    if let Err(err) = result {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
