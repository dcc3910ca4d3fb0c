use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Game catalog aggregation server and debugging CLI
#[derive(Parser)]
#[command(name = "freeplay")]
#[command(about = "Aggregate free-to-play games and giveaways behind a small HTTP API", long_about = None)]
pub struct Cli {
    /// Path to a TOML config file (defaults to the per-user config file, if any)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve /games and /proxy
    Serve {
        /// Override the listening port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the aggregated catalog
    Games,
    /// Relay a single URL the way /proxy does
    Proxy {
        /// Target URL
        url: String,
    },
    /// Run one debounced search and print the merged results
    Search {
        /// Search text
        query: String,
    },
    /// List current giveaways
    Giveaways {
        /// Giveaway type (game, loot, beta)
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
        /// Platform filter (pc, steam, epic-games-store, ...)
        #[arg(short, long)]
        platform: Option<String>,
    },
    /// Show details for one FreeToGame id
    Details {
        id: u64,
    },
}
