mod cli;
mod commands;
mod engine;
mod output;
mod rules_file;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Fetch(args) => commands::fetch::run(args).await,
        Commands::Local(args) => commands::local::run(args).await,
        Commands::Types(args) => commands::types::run(args).await,
    }
}
