//! tsload CLI for fetching and inspecting cached time series data sets.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tsload::{Config, UeaUcrDataset};

#[derive(Parser)]
#[command(name = "tsload")]
#[command(author, version)]
#[command(about = "Fetch, cache and inspect public time series data sets")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Override the cache directory
    #[arg(long, value_name = "DIR")]
    cache: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage data sets (list, fetch, info, clear)
    Datasets {
        #[command(subcommand)]
        command: DatasetCommands,
    },
}

#[derive(Subcommand)]
enum DatasetCommands {
    /// List cached data sets
    List,
    /// Fetch a UEA/UCR data set into the cache
    Fetch {
        /// Data set name (e.g. "ArrowHead", case-sensitive)
        name: String,
    },
    /// Load a UEA/UCR data set and print a summary
    Info {
        /// Data set name
        name: String,
    },
    /// Delete a data set from the cache
    Clear {
        /// Data set name
        name: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::LevelFilter::from_level(log_level))
        .init();

    let mut config = Config::default();
    if let Some(cache) = cli.cache {
        config.cache_home = cache;
    }

    match cli.command {
        Commands::Datasets { command } => handle_datasets(command, &config),
    }
}

fn handle_datasets(command: DatasetCommands, config: &Config) -> Result<()> {
    match command {
        DatasetCommands::List => {
            let root = &config.cache_home;
            if !root.is_dir() {
                println!("No cached data sets ({})", root.display());
                return Ok(());
            }

            let mut names: Vec<String> = fs::read_dir(root)
                .with_context(|| format!("reading {}", root.display()))?
                .filter_map(std::result::Result::ok)
                .filter(|entry| entry.path().is_dir())
                .filter_map(|entry| entry.file_name().into_string().ok())
                .collect();
            names.sort();

            println!("Cached data sets in {}:", root.display());
            for name in names {
                println!("  {name}");
            }
            Ok(())
        }
        DatasetCommands::Fetch { name } => {
            if UeaUcrDataset::is_cached(&name, config) {
                println!("{name} is already cached");
                return Ok(());
            }
            let dataset = UeaUcrDataset::load(&name, config)
                .with_context(|| format!("fetching {name}"))?;
            println!("Fetched {name} to {}", dataset.location.display());
            Ok(())
        }
        DatasetCommands::Info { name } => {
            let dataset =
                UeaUcrDataset::load(&name, config).with_context(|| format!("loading {name}"))?;

            println!("{name}");
            println!("  url:      {}", dataset.url);
            println!("  location: {}", dataset.location.display());
            let (n, len, dims) = dataset.x_train.shape();
            println!("  train:    {n} samples x {len} timesteps x {dims} dims");
            let (n, len, dims) = dataset.x_test.shape();
            println!("  test:     {n} samples x {len} timesteps x {dims} dims");
            Ok(())
        }
        DatasetCommands::Clear { name } => {
            UeaUcrDataset::clear_cache(&name, config)
                .with_context(|| format!("clearing {name}"))?;
            println!("Cleared {name}");
            Ok(())
        }
    }
}
