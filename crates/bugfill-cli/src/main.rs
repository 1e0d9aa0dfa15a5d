mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing::info;

/// Initialize tracing subscriber for logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default = if verbose { "debug" } else { "info,bugfill=debug" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    info!("Starting bugfill v{}", env!("CARGO_PKG_VERSION"));

    let config = commands::load_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Create(args) => commands::create(&config, args).await,
        Commands::Batch(args) => commands::batch(&config, args).await,
        Commands::Close => commands::close(&config).await,
        Commands::Schema => commands::schema(&config),
        Commands::Config(args) => commands::show_config(&config, cli.config.as_deref(), args),
    }
}
