//! review-enrich - Album review enrichment pipeline
//!
//! Subcommands:
//! - `fetch`: query MusicBrainz for reviews and merge results into the metadata store
//! - `profiles`: build artist genre profiles from the store
//! - `impute`: fill missing album genres from artist profiles
//! - `run`: fetch, profiles and impute in one go

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use review_common::config::{ConfigResolver, DataPaths, TomlConfig};
use review_enrich::genre_rules::GenreRules;
use review_enrich::pipeline::{self, RunSummary};
use review_enrich::services::MusicBrainzClient;
use review_enrich::store_writer::MergeMode;
use tracing::info;

/// Command-line arguments for review-enrich
#[derive(Parser, Debug)]
#[command(name = "review-enrich")]
#[command(about = "Enrich album reviews with MusicBrainz genres")]
#[command(version)]
struct Args {
    /// Config file (default: $REVIEW_ENRICH_CONFIG, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data folder (default: $REVIEW_ENRICH_DATA_DIR, then config, then ./data)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Review input file, overrides the configured path
    #[arg(long, global = true)]
    reviews: Option<PathBuf>,

    /// Metadata store file, overrides the configured path
    #[arg(long, global = true)]
    metadata: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch MusicBrainz metadata into the metadata store
    Fetch {
        /// How fetched records reconcile with the store
        #[arg(long, default_value_t = MergeMode::Append)]
        mode: MergeMode,
    },
    /// Build artist genre profiles from the metadata store
    Profiles {
        /// Profile file, overrides the configured path
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Impute missing genres from artist profiles
    Impute {
        /// Imputed metadata file, overrides the configured path
        #[arg(long)]
        output: Option<PathBuf>,

        /// Also write the profiles used for imputation here
        #[arg(long)]
        profiles_output: Option<PathBuf>,
    },
    /// Fetch, build profiles, then impute
    Run {
        #[arg(long, default_value_t = MergeMode::Append)]
        mode: MergeMode,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Resolve configuration before logging so the level can come from it
    let resolver = ConfigResolver::new(args.config.clone(), args.data_dir.clone());
    let config = resolver.load().context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!("Starting review-enrich");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let data_dir = resolver.data_dir(&config);
    let mut paths = DataPaths::resolve(&data_dir, &config.paths);
    if let Some(reviews) = args.reviews {
        paths.reviews = reviews;
    }
    if let Some(metadata) = args.metadata {
        paths.metadata = metadata;
    }

    info!("Data folder: {}", data_dir.display());
    info!("Metadata store: {}", paths.metadata.display());

    let summary = match args.command {
        Command::Fetch { mode } => {
            let client = build_client(&config)?;
            pipeline::fetch_run(&client, &paths, mode)
                .await
                .context("Metadata fetch failed")?
        }
        Command::Profiles { output } => {
            if let Some(output) = output {
                paths.profiles = output;
            }
            pipeline::profiles_run(&paths, &config.genres).context("Profile build failed")?
        }
        Command::Impute {
            output,
            profiles_output,
        } => {
            if let Some(output) = output {
                paths.imputed = output;
            }
            pipeline::impute_run(&paths, &config.genres, profiles_output.as_deref())
                .context("Genre imputation failed")?
        }
        Command::Run { mode } => {
            let client = build_client(&config)?;
            pipeline::run_all(&client, &paths, mode, &config.genres)
                .await
                .context("Pipeline run failed")?
        }
    };

    print_summary(&summary);
    Ok(())
}

fn build_client(config: &TomlConfig) -> Result<MusicBrainzClient> {
    let rules = GenreRules::from_toml(config).context("Invalid genre rules")?;
    let client = MusicBrainzClient::new(&config.musicbrainz)
        .context("Failed to initialize MusicBrainz client")?
        .with_rules(rules);

    info!(
        "MusicBrainz: {} (min interval {} ms)",
        config.musicbrainz.base_url, config.musicbrainz.min_interval_ms
    );
    Ok(client)
}

fn print_summary(summary: &RunSummary) {
    println!("{}", summary);
}
