use clap::Parser;
use std::path::PathBuf;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_NUMBER"));

#[derive(Parser, Debug, Default)]
#[command(name = "dbw", version = VERSION, about = "Databricks Jobs Watcher TUI")]
pub struct Cli {
    /// Named environment from the config file
    #[arg(short, long)]
    pub env: Option<String>,

    /// Workspace URL, e.g. https://dbc-1234.cloud.databricks.com (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Personal access token (overrides config; prefer DBW_TOKEN)
    #[arg(long)]
    pub token: Option<String>,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Auto-refresh interval in seconds (0 disables)
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Maximum concurrent last-run requests
    #[arg(long)]
    pub max_in_flight: Option<usize>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Write debug logs to the state directory
    #[arg(short, long)]
    pub verbose: bool,
}
