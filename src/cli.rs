use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "flightcheck")]
#[command(version, about = "Detect data-quality anomalies in flight route data")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full detection pipeline and print the status report
    Run {
        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// SQLite database path (overrides the config file)
        #[arg(long)]
        database: Option<PathBuf>,

        /// Output directory for all artifacts (overrides the config file)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Directory searched for fallback input files; may be repeated,
        /// earlier directories win (overrides the config file)
        #[arg(short, long)]
        data_dir: Vec<PathBuf>,
    },

    /// List the anomaly definitions in execution order
    ListAnomalies,
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
