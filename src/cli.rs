//! CLI definitions for expenser.

use std::path::PathBuf;

use clap::Parser;

/// Expenser CLI.
#[derive(Parser)]
#[command(name = "expenser")]
#[command(about = "Receipt-to-expense-report automation")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Directory containing receipt images
    #[arg(short, long, default_value = "receipts")]
    pub receipts_dir: PathBuf,

    /// Dry run: extract and plan, but never create report items
    #[arg(long)]
    pub test: bool,

    /// Lower the default log filter to debug
    #[arg(short, long)]
    pub verbose: bool,

    /// Probe the configured extraction endpoint and exit
    #[arg(long)]
    pub reset_llm: bool,
}
