use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Browser automation runtime", long_about = None)]
#[command(propagate_version = true)]
pub struct CliArgs {
    /// Configuration file path (YAML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level used when RUST_LOG/LOG_LEVEL aren't set
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Invoke one of the 26 `browser_*` tools and print its outcome as JSON
    Call {
        /// Tool name, e.g. "open", "navigate", "click"
        tool: String,
        /// Tool arguments as a JSON object
        #[arg(long, default_value = "{}")]
        json: String,
    },
    /// Print the action trace stats collected so far
    Stats,
    /// List sessions currently tracked by the pool
    Sessions,
}
