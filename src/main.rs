use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fastdl::output::{Printer, Verbosity};
use fastdl::sync::{CompressionLevel, CompressionType, ExclusionSet, SyncEngine};
use fastdl::Config;

/// Traverses game folders and publishes compressed copies in a FastDL manner.
#[derive(Parser, Debug)]
#[command(name = "fastdl", version, about)]
struct Cli {
    /// Performs full check on all files to ensure their validity (NOTE: very costly!)
    #[arg(short = 'f', long)]
    full_check: bool,

    /// Verbosity: 0 changes only, 1 adds header and footer, 2 adds blacklist,
    /// comparison and compression details
    #[arg(short = 'v', long = "verbose", default_value_t = 2,
          value_parser = clap::value_parser!(u8).range(0..=2))]
    verbose: u8,

    /// TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Game root folder
    #[arg(long)]
    source: Option<PathBuf>,

    /// FastDL root folder
    #[arg(long)]
    mirror: Option<PathBuf>,

    /// Blacklist file with one file name per line
    #[arg(long)]
    exclude_list: Option<PathBuf>,

    /// Compression used for mirror entries
    #[arg(long, value_enum)]
    compression: Option<CompressionType>,

    /// Compression level (1 fastest, 9 best)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=9))]
    level: Option<u8>,
}

impl Cli {
    fn resolve_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(source) = &self.source {
            config.source_root = source.clone();
        }
        if let Some(mirror) = &self.mirror {
            config.mirror_root = mirror.clone();
        }
        if let Some(list) = &self.exclude_list {
            config.exclude_list = list.clone();
        }
        if let Some(compression) = self.compression {
            config.compression = compression;
        }
        if let Some(level) = self.level {
            config.level = CompressionLevel::new(level);
        }
        Ok(config)
    }
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fastdl=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    let printer = Printer::new(Verbosity(cli.verbose));

    let engine = SyncEngine::new(config.sync_options(cli.full_check))
        .with_event_callback(move |event| printer.event(event));

    // Refuse to start before reading anything else.
    if let Err(e) = engine.check_roots() {
        println!("{}", e);
        return Ok(ExitCode::FAILURE);
    }

    let exclusions = ExclusionSet::load(&config.exclude_list)?;
    printer.exclusion_list(&config.exclude_list, exclusions.as_ref());

    let report = engine.sync(&config.folders, exclusions.as_ref())?;

    if let Some(e) = report.failure() {
        eprintln!("{} {}", "Error:".red().bold(), e);
    }
    printer.summary(&report);

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
