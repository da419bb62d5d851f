//! Maintenance CLI for the dataflows cache and configuration.
//!
//! ```bash
//! # Entry counts of both cache tiers
//! dataflows cache stats
//!
//! # Drop cached price data only
//! dataflows cache clear --method get_stock_data
//!
//! # Effective configuration and standard vendor routes
//! dataflows config
//! dataflows routes
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod main_lib;

use main_lib::{init_tracing, load_config};

#[derive(Parser)]
#[command(name = "dataflows")]
#[command(about = "Inspect and maintain the market data fetch cache", long_about = None)]
#[command(version)]
struct Cli {
    /// Cache directory, overrides TA_CACHE_DIR
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Durable cache maintenance
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Print the effective configuration as JSON
    Config,

    /// Print the standard vendor order of every method
    Routes,
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show entry counts and settings
    Stats,

    /// Remove cached entries
    Clear {
        /// Only remove entries of this method, e.g. get_stock_data
        #[arg(short, long)]
        method: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.cache_dir);

    match cli.command {
        Commands::Cache { action } => match action {
            CacheAction::Stats => commands::cache::stats(&config)?,
            CacheAction::Clear { method } => commands::cache::clear(&config, method.as_deref())?,
        },
        Commands::Config => commands::config::show(&config)?,
        Commands::Routes => commands::config::routes(&config)?,
    }
    Ok(())
}
