use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use coalesce::entity::similarity::{score, SimilarityMetric};
use coalesce::logging::configure_logging;
use coalesce::pipeline::{process_duplicate_removal, process_entity_resolution};
use coalesce::table::{read_rows, write_dedup_file, write_resolution_file, Table};
use coalesce::{MatchStrategy, QueryKey, ResolverConfig, TARGET_PIPELINE};

#[derive(Parser)]
#[command(author, version, about = "Resolve company names and bank identifiers into entities", long_about = None)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deduplicate the input and resolve entities, writing both tables
    Run(Io),

    /// Only remove anomalies and duplicates
    Dedup(Io),

    /// Print the similarity of two strings
    Score {
        left: String,
        right: String,
    },
}

#[derive(Args)]
struct Io {
    /// Input CSV file
    #[arg(short = 'f', long)]
    input_file: PathBuf,

    /// Existing folder for the output tables
    #[arg(short, long)]
    output_folder: PathBuf,
}

/// Overrides applied after the config file and environment.
#[derive(Args)]
struct Settings {
    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    name_column: Option<String>,

    #[arg(long, global = true)]
    identifier_column: Option<String>,

    /// Identifier value marking a row as invalid
    #[arg(long, global = true)]
    invalid_sentinel: Option<String>,

    #[arg(long, global = true, value_enum)]
    metric: Option<SimilarityMetric>,

    #[arg(long, global = true, value_enum)]
    strategy: Option<MatchStrategy>,

    #[arg(long, global = true, value_enum)]
    query_key: Option<QueryKey>,

    /// Worker threads for matching (default: all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Fail on identifiers too short to truncate
    #[arg(long, global = true)]
    strict_identifiers: bool,

    /// Also write a daily rolling log file here
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
}

impl Settings {
    fn resolve(&self) -> Result<ResolverConfig> {
        let base = match &self.config {
            Some(path) => ResolverConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ResolverConfig::default(),
        };
        let mut config = base.with_env().context("Invalid environment settings")?;

        if let Some(value) = &self.name_column {
            config.name_column = value.clone();
        }
        if let Some(value) = &self.identifier_column {
            config.identifier_column = value.clone();
        }
        if let Some(value) = &self.invalid_sentinel {
            config.invalid_sentinel = value.clone();
        }
        if let Some(metric) = self.metric {
            config.metric = metric;
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(query_key) = self.query_key {
            config.query_key = query_key;
        }
        if self.threads.is_some() {
            config.threads = self.threads;
        }
        if self.strict_identifiers {
            config.strict_identifiers = true;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

fn check_io(io: &Io) -> Result<()> {
    if !io.input_file.is_file() {
        bail!("Input file {} does not exist", io.input_file.display());
    }
    if !io.output_folder.is_dir() {
        bail!("Output folder {} does not exist", io.output_folder.display());
    }
    Ok(())
}

fn load(path: &Path, config: &ResolverConfig) -> Result<Table> {
    read_rows(path, config).with_context(|| format!("Failed to read {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    configure_logging(cli.settings.log_dir.as_deref());
    let config = cli.settings.resolve()?;

    match cli.command {
        Commands::Run(io) => {
            check_io(&io)?;
            let start = Instant::now();
            let Table { layout, rows } = load(&io.input_file, &config)?;

            let (deduplicated, stats) = process_duplicate_removal(rows, &config)?;
            write_dedup_file(&io.output_folder, &layout, &deduplicated)
                .context("Failed to write deduplicated table")?;
            info!(target: TARGET_PIPELINE, "Kept {} of {} rows", stats.kept(), stats.input);

            let resolution = process_entity_resolution(deduplicated, &config)?;
            write_resolution_file(&io.output_folder, &config, &resolution.entities)
                .context("Failed to write resolution table")?;

            info!(
                target: TARGET_PIPELINE,
                "Finished: {} entities from {} canonical keys in {:.2?}",
                resolution.entities.len(),
                resolution.universe_size,
                start.elapsed()
            );
        }

        Commands::Dedup(io) => {
            check_io(&io)?;
            let Table { layout, rows } = load(&io.input_file, &config)?;

            let (deduplicated, stats) = process_duplicate_removal(rows, &config)?;
            write_dedup_file(&io.output_folder, &layout, &deduplicated)
                .context("Failed to write deduplicated table")?;
            info!(
                target: TARGET_PIPELINE,
                "Kept {} of {} rows ({} missing, {} invalid, {} duplicates)",
                stats.kept(),
                stats.input,
                stats.missing,
                stats.invalid,
                stats.duplicates
            );
        }

        Commands::Score { left, right } => {
            println!("{}", score(config.metric, &left, &right));
        }
    }

    Ok(())
}
