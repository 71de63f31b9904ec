use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cartgrab::cli::{commands, Cli, Commands};
use cartgrab::config::ScrapeConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config = ScrapeConfig::load(cli.config.as_deref())?;
    if cli.headed {
        config.headless = false;
    }

    match cli.command {
        Commands::Lookup { identifiers } => {
            commands::lookup(config, &identifiers).await?;
        }
        Commands::Cart { url } => {
            commands::cart(config, &url).await?;
        }
    }

    Ok(())
}
