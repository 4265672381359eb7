//! JSONL reading and atomic file replacement
//!
//! Every output file (metadata store, profiles, imputed set) is written
//! through [`atomic_replace`]: content goes to a temp file in the target
//! directory, is synced, then renamed over the target. Readers never see
//! a half-written file and a crash leaves the previous version in place.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Read one JSON value per line
///
/// Blank lines are ignored. Lines that fail to parse are logged and
/// skipped so that one bad line does not sink a whole corpus.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut items = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<T>(line) {
            Ok(item) => items.push(item),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    line = index + 1,
                    error = %e,
                    "Skipping invalid JSON line"
                );
            }
        }
    }

    debug!(path = %path.display(), count = items.len(), "Loaded JSONL");
    Ok(items)
}

/// Read one JSON value per line, failing on the first bad line
///
/// For files this crate rewrites (the metadata store): a line that is
/// skipped on read would be gone after the next write. A missing file
/// reads as empty; blank lines are ignored.
pub fn read_jsonl_strict<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        debug!(path = %path.display(), "JSONL file not present, starting empty");
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut items = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let item = serde_json::from_str::<T>(line).map_err(|e| Error::CorruptLine {
            path: path.display().to_string(),
            line: index + 1,
            message: e.to_string(),
        })?;
        items.push(item);
    }

    debug!(path = %path.display(), count = items.len(), "Loaded JSONL (strict)");
    Ok(items)
}

/// Atomically replace `path` with one JSON line per item
pub fn write_jsonl_atomic<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    atomic_replace(path, |writer| {
        for item in items {
            serde_json::to_writer(&mut *writer, item)?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    })
}

/// Atomically replace `path` with a pretty-printed JSON document
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    atomic_replace(path, |writer| {
        serde_json::to_writer_pretty(&mut *writer, value)?;
        writer.write_all(b"\n")?;
        Ok(())
    })
}

/// Write via temp file + rename in the target's directory
///
/// The temp file must live on the same filesystem as the target for the
/// rename to be atomic, hence `NamedTempFile::new_in(parent)`.
pub fn atomic_replace<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> Result<()>,
{
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let mut temp = NamedTempFile::new_in(parent)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        write(&mut writer)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;

    temp.persist(path)
        .map_err(|e| Error::Io(e.error))?;

    debug!(path = %path.display(), "Atomically replaced file");
    Ok(())
}
