//! Sidechain RPC node
//!
//! Serves the JSON command surface over a development chain.

use clap::{Parser, Subcommand};
use sidechain_rpc::cli;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sidechain-rpc")]
#[command(version)]
#[command(about = "Command surface of a merge-mined sidechain node", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the command server
    Serve {
        /// Port to listen on, overriding the configuration
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();
    match args.command {
        Commands::Serve { port } => {
            let config = cli::load_config(args.config.as_deref(), port)?;
            cli::init_logging(&config)?;
            cli::cmd_serve(config)
        }
        Commands::Config => {
            let config = cli::load_config(args.config.as_deref(), None)?;
            cli::init_logging(&config)?;
            cli::cmd_show_config(&config)
        }
    }
}
