//! Buckets command - list cache buckets

use crate::cli::args::{BucketsArgs, OutputFormat};
use crate::config::{Config, ConfigManager};
use crate::error::CacheResult;
use crate::storage::{CacheStorage, DiskStorage};
use console::style;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct BucketSummary {
    name: String,
    entries: usize,
    current: bool,
}

/// Execute the buckets command
pub async fn execute(args: BucketsArgs, config: &Config) -> CacheResult<()> {
    let storage = DiskStorage::open_root(ConfigManager::storage_dir(config)).await?;
    let buckets = summarize(&storage, &config.cache.version).await?;

    if buckets.is_empty() && !matches!(args.format, OutputFormat::Json) {
        println!("No cache buckets found.");
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(&buckets),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&buckets)?),
        OutputFormat::Plain => {
            for bucket in &buckets {
                println!("{}", bucket.name);
            }
        }
    }

    Ok(())
}

async fn summarize(storage: &dyn CacheStorage, current: &str) -> CacheResult<Vec<BucketSummary>> {
    let mut buckets = Vec::new();
    for name in storage.keys().await? {
        let Some(bucket) = storage.open_existing(&name).await? else {
            continue;
        };
        buckets.push(BucketSummary {
            entries: bucket.keys().await?.len(),
            current: name == current,
            name,
        });
    }
    Ok(buckets)
}

fn print_table(buckets: &[BucketSummary]) {
    println!("{:<32} {:<10} {:<10}", "BUCKET", "ENTRIES", "STATUS");
    println!("{}", "-".repeat(54));

    for bucket in buckets {
        let status = if bucket.current {
            style("current").green().to_string()
        } else {
            style("stale").yellow().to_string()
        };
        println!("{:<32} {:<10} {:<10}", bucket.name, bucket.entries, status);
    }

    println!();
    println!("Total: {} bucket(s)", buckets.len());
}
