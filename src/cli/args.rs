//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use uuid::Uuid;

/// intercache - Request-intercepting offline cache
///
/// Plays the hosting environment for a versioned resource cache:
/// delivers install, activate, fetch, sync and push events.
#[derive(Parser, Debug)]
#[command(name = "intercache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "INTERCACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the cache version tag from the configuration
    #[arg(long, global = true, env = "INTERCACHE_CACHE_VERSION")]
    pub cache_version: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision the current version's bucket with the essential URLs
    Install,

    /// Delete stale buckets and take over all clients
    Activate,

    /// Resolve a request: cache first, then network, then fallback page
    Fetch(FetchArgs),

    /// List cache buckets
    Buckets(BucketsArgs),

    /// Display a push notification
    Push(PushArgs),

    /// Handle a click on a notification
    Click(ClickArgs),

    /// Run the background sync task registered for a tag
    Sync(SyncArgs),

    /// Show lifecycle state and bucket summary
    Status,

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// URL to resolve (relative URLs resolve against cache.scope)
    pub url: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Request header (Name: value)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Request body
    #[arg(short, long)]
    pub data: Option<String>,

    /// Print the response body
    #[arg(long)]
    pub body: bool,
}

/// Arguments for the buckets command
#[derive(Parser, Debug)]
pub struct BucketsArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the push command
#[derive(Parser, Debug)]
pub struct PushArgs {
    /// Push payload (JSON with optional "title" and "body")
    #[arg(short, long)]
    pub data: Option<String>,
}

/// Arguments for the click command
#[derive(Parser, Debug)]
pub struct ClickArgs {
    /// Notification ID (a fresh one if omitted)
    #[arg(long)]
    pub id: Option<Uuid>,
}

/// Arguments for the sync command
#[derive(Parser, Debug)]
pub struct SyncArgs {
    /// Sync tag, e.g. sync-inventory
    pub tag: String,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for list commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// Parse a header in `Name: value` format
fn parse_header(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find(':')
        .ok_or_else(|| format!("invalid 'Name: value' format: no ':' found in '{s}'"))?;
    let name = s[..pos].trim();
    if name.is_empty() {
        return Err(format!("empty header name in '{s}'"));
    }
    Ok((name.to_string(), s[pos + 1..].trim().to_string()))
}
