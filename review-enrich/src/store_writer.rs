//! Metadata store merge and persistence
//!
//! The store is a JSONL file holding at most one [`MetadataRecord`] per
//! `review_id`. A run loads the whole store, merges the freshly fetched
//! records into it according to a [`MergeMode`], and replaces the file
//! atomically in a single write.

use review_common::jsonl::{read_jsonl_strict, write_jsonl_atomic};
use review_common::{Error, MetadataRecord, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// How incoming records reconcile with the existing store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Keep stored records, add only unseen ids
    #[default]
    Append,
    /// Replace stored records in place, add unseen ids
    Update,
    /// Discard the store and keep only incoming records
    Overwrite,
}

impl MergeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeMode::Append => "append",
            MergeMode::Update => "update",
            MergeMode::Overwrite => "overwrite",
        }
    }
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append" => Ok(MergeMode::Append),
            "update" => Ok(MergeMode::Update),
            "overwrite" => Ok(MergeMode::Overwrite),
            other => Err(Error::InvalidInput(format!(
                "Unknown merge mode '{}' (expected append, update or overwrite)",
                other
            ))),
        }
    }
}

/// Merge `incoming` into `existing`
///
/// Output order is stable: surviving existing records keep their
/// positions and new ids follow in arrival order.
///
/// # Errors
/// [`Error::DuplicateReviewId`] if `existing` already holds a repeated id.
pub fn merge(
    existing: Vec<MetadataRecord>,
    incoming: Vec<MetadataRecord>,
    mode: MergeMode,
) -> Result<Vec<MetadataRecord>> {
    verify_unique(&existing)?;

    let existing_count = existing.len();
    let incoming_count = incoming.len();

    let merged = match mode {
        MergeMode::Append => append(existing, incoming),
        MergeMode::Update => upsert(existing, incoming),
        MergeMode::Overwrite => upsert(Vec::new(), incoming),
    };

    verify_unique(&merged)?;

    debug!(
        mode = %mode,
        existing = existing_count,
        incoming = incoming_count,
        merged = merged.len(),
        "Merged metadata records"
    );
    Ok(merged)
}

/// First occurrence of each id wins
fn append(mut records: Vec<MetadataRecord>, incoming: Vec<MetadataRecord>) -> Vec<MetadataRecord> {
    let mut seen: HashSet<i64> = records.iter().map(|r| r.review_id).collect();
    for record in incoming {
        if seen.insert(record.review_id) {
            records.push(record);
        }
    }
    records
}

/// Last occurrence of each id wins, at the position of the first
fn upsert(mut records: Vec<MetadataRecord>, incoming: Vec<MetadataRecord>) -> Vec<MetadataRecord> {
    let mut positions: HashMap<i64, usize> = records
        .iter()
        .enumerate()
        .map(|(pos, r)| (r.review_id, pos))
        .collect();

    for record in incoming {
        match positions.get(&record.review_id) {
            Some(&pos) => records[pos] = record,
            None => {
                positions.insert(record.review_id, records.len());
                records.push(record);
            }
        }
    }
    records
}

/// Fail on the first repeated `review_id`
pub fn verify_unique(records: &[MetadataRecord]) -> Result<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.review_id) {
            return Err(Error::DuplicateReviewId(record.review_id));
        }
    }
    Ok(())
}

/// Load the metadata store (a missing file is an empty store)
///
/// Every non-blank line must parse: the store is rewritten in full after
/// a fetch, so a skipped line would be lost. Fields the model does not
/// know are carried in [`MetadataRecord::extra`].
///
/// # Errors
/// [`Error::CorruptLine`] for the first line that does not parse.
pub fn load_store(path: &Path) -> Result<Vec<MetadataRecord>> {
    let records: Vec<MetadataRecord> = read_jsonl_strict(path)?;
    info!(path = %path.display(), records = records.len(), "Loaded metadata store");
    Ok(records)
}

/// Atomically replace the metadata store
pub fn write_store(path: &Path, records: &[MetadataRecord]) -> Result<()> {
    write_jsonl_atomic(path, records)?;
    info!(path = %path.display(), records = records.len(), "Wrote metadata store");
    Ok(())
}
