//! stockcast CLI - serve, query and inspect quantity prediction models.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stockcast_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so `predict` and `inspect` output stays parseable.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("stockcast=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(cmd) => cmd.run().await?,
        Commands::Predict(cmd) => cmd.run()?,
        Commands::Inspect(cmd) => cmd.run()?,
    }

    info!("stockcast completed successfully");
    Ok(())
}
