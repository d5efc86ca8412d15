//! intercache - Request-intercepting offline cache
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use intercache::cli::{Cli, Commands};
use intercache::config::ConfigManager;
use intercache::error::CacheResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> CacheResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let mut config = config_manager.load().await?;

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("intercache=warn"),
        1 => EnvFilter::new("intercache=info"),
        _ => EnvFilter::new("intercache=debug"),
    };

    if config.general.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .init();
    }

    if let Some(version) = cli.cache_version {
        debug!("Cache version overridden: {}", version);
        config.cache.version = version;
    }

    // Config command works on the file, not the cache
    if let Commands::Config(args) = cli.command {
        return intercache::cli::commands::config(args, &config_manager, &config).await;
    }

    ConfigManager::ensure_state_dirs(&config).await?;

    match cli.command {
        Commands::Config(_) => unreachable!("Config handled above"),
        Commands::Install => intercache::cli::commands::install(&config).await,
        Commands::Activate => intercache::cli::commands::activate(&config).await,
        Commands::Fetch(args) => intercache::cli::commands::fetch(args, &config).await,
        Commands::Buckets(args) => intercache::cli::commands::buckets(args, &config).await,
        Commands::Push(args) => intercache::cli::commands::push(args, &config).await,
        Commands::Click(args) => intercache::cli::commands::click(args, &config).await,
        Commands::Sync(args) => intercache::cli::commands::sync(args, &config).await,
        Commands::Status => intercache::cli::commands::status(&config).await,
    }
}
