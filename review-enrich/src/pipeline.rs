//! Enrichment pipeline orchestration
//!
//! Wires the metadata client, store writer, profile builder and imputer
//! into the four runs the binary exposes: `fetch`, `profiles`, `impute`
//! and `run` (all three in sequence).
//!
//! Processing is sequential in input order. Every output file is replaced
//! atomically once per run.

use crate::artist_profiles::{build_profiles, save_profiles};
use crate::genre_imputer::impute;
use crate::services::{FetchOutcome, MusicBrainzClient};
use crate::store_writer::{load_store, merge, verify_unique, write_store, MergeMode};
use chrono::{DateTime, Utc};
use review_common::config::{DataPaths, GenrePolicy};
use review_common::jsonl::{read_jsonl, write_jsonl_atomic};
use review_common::{Error, Result, ReviewRecord};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Log progress every N reviews during a fetch
const PROGRESS_INTERVAL: usize = 50;

/// Counters reported at the end of every run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub command: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// Input records looked at
    pub processed: usize,
    /// Reviews not fetched because their id was already stored or repeated
    pub skipped_existing: usize,
    pub fetched: usize,
    pub not_found: usize,
    /// Extra provider attempts across all fetches
    pub retried: usize,
    pub imputed: usize,
    /// Records (or profiles) in the files written by this run
    pub written: usize,
}

impl RunSummary {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            command: command.into(),
            started_at: Utc::now(),
            duration_ms: 0,
            processed: 0,
            skipped_existing: 0,
            fetched: 0,
            not_found: 0,
            retried: 0,
            imputed: 0,
            written: 0,
        }
    }

    fn finish(mut self, started: Instant) -> Self {
        self.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            run_id = %self.run_id,
            command = %self.command,
            processed = self.processed,
            skipped_existing = self.skipped_existing,
            fetched = self.fetched,
            not_found = self.not_found,
            retried = self.retried,
            imputed = self.imputed,
            written = self.written,
            duration_ms = self.duration_ms,
            "Run complete"
        );
        self
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} run {} ({} ms)", self.command, self.run_id, self.duration_ms)?;
        writeln!(f, "  processed:        {}", self.processed)?;
        writeln!(f, "  skipped existing: {}", self.skipped_existing)?;
        writeln!(f, "  fetched:          {}", self.fetched)?;
        writeln!(f, "  not found:        {}", self.not_found)?;
        writeln!(f, "  retried:          {}", self.retried)?;
        writeln!(f, "  imputed:          {}", self.imputed)?;
        write!(f, "  written:          {}", self.written)
    }
}

/// Read the scraped review stream
///
/// Lines without an id, artist or album are skipped with a warning.
pub fn load_reviews(path: &Path) -> Result<Vec<ReviewRecord>> {
    if !path.exists() {
        return Err(Error::InvalidInput(format!(
            "Review file not found: {}",
            path.display()
        )));
    }

    let reviews: Vec<ReviewRecord> = read_jsonl(path)?;
    let total = reviews.len();
    let usable: Vec<ReviewRecord> = reviews
        .into_iter()
        .filter(|review| {
            let complete = !review.artist.trim().is_empty() && !review.album.trim().is_empty();
            if !complete {
                warn!(review_id = review.review_id, "Review lacks artist or album, skipping");
            }
            complete
        })
        .collect();

    info!(
        path = %path.display(),
        reviews = usable.len(),
        skipped = total - usable.len(),
        "Loaded reviews"
    );
    Ok(usable)
}

/// Fetch metadata for the reviews and merge it into the store
///
/// In [`MergeMode::Append`] reviews already in the store are never sent
/// to the provider. Repeated ids in the input are fetched once. A store
/// with duplicate ids aborts the run before any request is made.
pub async fn fetch_run(
    client: &MusicBrainzClient,
    paths: &DataPaths,
    mode: MergeMode,
) -> Result<RunSummary> {
    let started = Instant::now();
    let mut summary = RunSummary::new("fetch");
    info!(run_id = %summary.run_id, mode = %mode, "Starting metadata fetch");

    let reviews = load_reviews(&paths.reviews)?;
    let existing = load_store(&paths.metadata)?;
    verify_unique(&existing)?;

    let stored: HashSet<i64> = match mode {
        MergeMode::Append => existing.iter().map(|r| r.review_id).collect(),
        MergeMode::Update | MergeMode::Overwrite => HashSet::new(),
    };

    let mut attempted = HashSet::new();
    let mut incoming = Vec::new();

    for review in &reviews {
        summary.processed += 1;

        if stored.contains(&review.review_id) || !attempted.insert(review.review_id) {
            summary.skipped_existing += 1;
            continue;
        }

        let result = client
            .fetch_metadata(review.review_id, &review.artist, &review.album)
            .await;
        summary.retried += result.retries as usize;

        match result.outcome {
            FetchOutcome::Found(record) => {
                summary.fetched += 1;
                incoming.push(record);
            }
            FetchOutcome::NotFound(_) => summary.not_found += 1,
        }

        if summary.processed % PROGRESS_INTERVAL == 0 {
            info!(
                processed = summary.processed,
                total = reviews.len(),
                fetched = summary.fetched,
                not_found = summary.not_found,
                "Fetch progress"
            );
        }
    }

    let merged = merge(existing, incoming, mode)?;
    write_store(&paths.metadata, &merged)?;
    summary.written = merged.len();

    Ok(summary.finish(started))
}

/// Build artist profiles from the store and write them to `paths.profiles`
pub fn profiles_run(paths: &DataPaths, policy: &GenrePolicy) -> Result<RunSummary> {
    let started = Instant::now();
    let mut summary = RunSummary::new("profiles");

    let metadata = load_store(&paths.metadata)?;
    summary.processed = metadata.len();

    let profiles = build_profiles(&metadata, policy);
    save_profiles(&paths.profiles, &profiles)?;
    summary.written = profiles.len();

    Ok(summary.finish(started))
}

/// Impute missing genres and write the imputed set to `paths.imputed`
///
/// Profiles are rebuilt from the current store. When `profiles_output` is
/// given they are also written there.
pub fn impute_run(
    paths: &DataPaths,
    policy: &GenrePolicy,
    profiles_output: Option<&Path>,
) -> Result<RunSummary> {
    let started = Instant::now();
    let mut summary = RunSummary::new("impute");

    let metadata = load_store(&paths.metadata)?;
    summary.processed = metadata.len();

    let profiles = build_profiles(&metadata, policy);
    if let Some(path) = profiles_output {
        save_profiles(path, &profiles)?;
    }

    let (imputed, stats) = impute(&metadata, &profiles);
    write_jsonl_atomic(&paths.imputed, &imputed)?;
    info!(path = %paths.imputed.display(), records = imputed.len(), "Wrote imputed metadata");

    summary.imputed = stats.imputed;
    summary.written = imputed.len();

    Ok(summary.finish(started))
}

/// Fetch, build profiles, then impute
pub async fn run_all(
    client: &MusicBrainzClient,
    paths: &DataPaths,
    mode: MergeMode,
    policy: &GenrePolicy,
) -> Result<RunSummary> {
    let started = Instant::now();
    let mut summary = RunSummary::new("run");

    let fetch = fetch_run(client, paths, mode).await?;
    summary.processed = fetch.processed;
    summary.skipped_existing = fetch.skipped_existing;
    summary.fetched = fetch.fetched;
    summary.not_found = fetch.not_found;
    summary.retried = fetch.retried;

    profiles_run(paths, policy)?;

    let imputation = impute_run(paths, policy, None)?;
    summary.imputed = imputation.imputed;
    summary.written = imputation.written;

    Ok(summary.finish(started))
}
