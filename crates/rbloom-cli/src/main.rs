//! rbloom: operate Bloom filters kept in a shared bit store file.
//!
//! Any number of `rbloom` processes may point at the same store file and work on the
//! same named filter; the store serializes each bit operation.

mod harness;
mod logging;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use remote_bloom::domain::{DEFAULT_ERROR_RATE, DEFAULT_MAX_BITS};
use remote_bloom::{
    BitStore, FileBackedBitStore, FilterConfig, FilterConfigBuilder, FilterSummary,
    InMemoryBitStore, RemoteBloomFilter,
};

use crate::harness::run_selftest;
use crate::logging::{init_logging, LogConfig};

/// rbloom: Bloom filters backed by a shared bit store
#[derive(Parser, Debug)]
#[command(name = "rbloom")]
#[command(about = "Add to and query Bloom filters kept in a shared bit store")]
struct Args {
    /// Path of the bit store file
    #[arg(short, long, default_value = "rbloom.db")]
    store: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct FilterArgs {
    /// Filter name (key in the store)
    #[arg(short, long)]
    name: Option<String>,

    /// Expected maximum number of distinct items
    #[arg(short, long)]
    capacity: Option<u64>,

    /// Target false positive rate, between 0 and 1
    #[arg(short, long, default_value_t = DEFAULT_ERROR_RATE)]
    error_rate: f64,

    /// Read the filter configuration from a JSON file instead of flags
    #[arg(long, conflicts_with_all = ["name", "capacity"])]
    config: Option<PathBuf>,

    /// Fail if an existing array was created with different parameters
    #[arg(long)]
    verify: bool,
}

impl FilterArgs {
    fn to_config(&self) -> Result<FilterConfig> {
        let config = match &self.config {
            Some(path) => load_config(path)?,
            None => {
                let Some(name) = &self.name else {
                    bail!("either --name or --config is required");
                };
                let Some(capacity) = self.capacity else {
                    bail!("--capacity is required with --name");
                };
                FilterConfigBuilder::new(name.clone())
                    .capacity(capacity)
                    .error_rate(self.error_rate)
                    .build()?
            }
        };
        let verify = self.verify || config.verify_existing;
        Ok(config.with_verify_existing(verify))
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print derived parameters without touching the store
    Info {
        #[command(flatten)]
        filter: FilterArgs,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add items to a filter
    Add {
        #[command(flatten)]
        filter: FilterArgs,

        /// Items to add
        #[arg(required = true)]
        items: Vec<String>,
    },

    /// Check whether items might be in a filter
    Lookup {
        #[command(flatten)]
        filter: FilterArgs,

        /// Items to check
        #[arg(required = true)]
        items: Vec<String>,
    },

    /// Delete a filter's bit array and reserve a fresh one
    Reset {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Measure the false positive rate with random UUIDs
    Selftest {
        /// Filter name used for the run (reset before and after)
        #[arg(short, long, default_value = "rbloom-selftest")]
        name: String,

        #[arg(short, long, default_value_t = 100)]
        capacity: u64,

        #[arg(short, long, default_value_t = DEFAULT_ERROR_RATE)]
        error_rate: f64,

        /// Number of lookup rounds of `capacity` items each
        #[arg(short = 'x', long, default_value_t = 200)]
        experiments: usize,

        /// Use a process-local store instead of the store file
        #[arg(long)]
        in_memory: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn load_config(path: &Path) -> Result<FilterConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading filter config {}", path.display()))?;
    let config: FilterConfig = serde_json::from_str(&text)
        .with_context(|| format!("parsing filter config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Derived parameters for `config`, rejected like `open` would reject them
fn summarize(config: &FilterConfig) -> Result<FilterSummary> {
    let params = config.params()?;
    params.ensure_fits(DEFAULT_MAX_BITS)?;
    Ok(FilterSummary::new(config, &params))
}

async fn open_filter(
    store: &Path,
    config: FilterConfig,
) -> Result<RemoteBloomFilter<FileBackedBitStore>> {
    let store = Arc::new(FileBackedBitStore::new(store));
    RemoteBloomFilter::open(config, store)
        .await
        .context("opening filter")
}

async fn selftest<S: BitStore + ?Sized>(
    config: FilterConfig,
    store: Arc<S>,
    experiments: usize,
    json: bool,
) -> Result<()> {
    let filter = RemoteBloomFilter::open(config.with_reset(true), store.clone()).await?;
    filter.log_summary();

    let report = run_selftest(&filter, experiments).await?;
    store.delete(filter.name()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", filter.describe());
        println!("---");
        println!(
            "Average number of false positives: {} of {}",
            report.average_false_positives, report.capacity
        );
        println!(
            "Error rate (false positives) for the test: {:.2}%",
            report.false_positive_rate * 100.0
        );
    }
    info!(
        false_positives = report.false_positives,
        total_lookups = report.total_lookups,
        rate = report.false_positive_rate,
        target = report.target_error_rate,
        "Selftest complete"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&LogConfig::from_env())?;

    match args.command {
        Command::Info { filter, json } => {
            let summary = summarize(&filter.to_config()?)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{summary}");
            }
        }

        Command::Add { filter, items } => {
            let filter = open_filter(&args.store, filter.to_config()?).await?;
            let added = filter.add_many(&items).await?;
            info!(filter = filter.name(), added, "Items added");
        }

        Command::Lookup { filter, items } => {
            let filter = open_filter(&args.store, filter.to_config()?).await?;
            for item in &items {
                let verdict = if filter.lookup(item.as_bytes()).await? {
                    "maybe"
                } else {
                    "no"
                };
                println!("{item}\t{verdict}");
            }
        }

        Command::Reset { filter } => {
            let config = filter.to_config()?.with_reset(true);
            let filter = open_filter(&args.store, config).await?;
            println!("Reset filter {}", filter.name());
        }

        Command::Selftest {
            name,
            capacity,
            error_rate,
            experiments,
            in_memory,
            json,
        } => {
            let config = FilterConfig::new(name, capacity, error_rate)?;
            if in_memory {
                let store = Arc::new(InMemoryBitStore::new());
                selftest(config, store, experiments, json).await?;
            } else {
                let store = Arc::new(FileBackedBitStore::new(&args.store));
                selftest(config, store, experiments, json).await?;
            }
        }
    }

    Ok(())
}
