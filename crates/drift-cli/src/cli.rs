//! Command line arguments

use clap::Parser;
use std::path::PathBuf;

/// Compare two versions of an API, or one API against a captured baseline.
#[derive(Parser, Debug)]
#[command(name = "apidrift")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// YAML configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Where the JSON report is written
    #[arg(short, long, default_value = "results.json")]
    pub output: PathBuf,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
