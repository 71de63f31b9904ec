pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cartgrab")]
#[command(about = "Headless-browser cart and product lookup", long_about = None)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<std::path::PathBuf>,

    /// Run the browser with a visible window
    #[arg(long, global = true)]
    pub headed: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Look up products by identifier
    Lookup {
        /// Product identifiers (10-character codes), up to 10 per call
        #[arg(required = true)]
        identifiers: Vec<String>,
    },
    /// Resolve a shared cart URL
    Cart {
        /// The cart URL to resolve
        url: String,
    },
}
