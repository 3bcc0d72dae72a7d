use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "coinrates")]
#[command(about = "CoinRates - current and historical cryptocurrency prices")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API and the background refresh worker
    Start {
        /// Path to the configuration file (default: $CONFIG_FILE_PATH or config/coinrates.yaml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override HTTP port
        #[arg(long)]
        http: Option<u16>,
    },

    /// Refresh every known title once and exit
    Refresh {
        /// Path to the configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Validate configuration without starting the service
    Validate {
        /// Path to the configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Initialize a new configuration file with all defaults
    Init {
        /// Output path for the new configuration file
        #[arg(short, long, default_value = "config/coinrates.yaml")]
        output: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
