// File: src/persistence.rs
//! File round trips: pretty JSON for dictionaries and metadata, bincode for
//! word-pool snapshots.
//!
//! Every write goes to a temporary file in the destination directory and is
//! then renamed into place, so a partition file is either absent or complete.
//! Nothing is rolled back across files.

use crate::core::dictionary::Dictionary;
use crate::core::types::Word;
use crate::error::{DitongError, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// Runs `write` against a temporary file next to `path`, then renames it
/// into place.
pub(crate) fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&NamedTempFile>) -> Result<()>,
{
    let parent_dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent_dir).map_err(|e| DitongError::io(parent_dir, e))?;

    let temp_file = NamedTempFile::new_in(parent_dir).map_err(|e| DitongError::io(parent_dir, e))?;
    {
        let mut writer = BufWriter::new(&temp_file);
        write(&mut writer)?;
        writer.flush().map_err(|e| DitongError::io(path, e))?;
    }

    temp_file
        .persist(path)
        .map_err(|e| DitongError::io(path, e.error))?;
    Ok(())
}

/// Writes `value` as pretty-printed JSON. Non-ASCII text is kept as is.
pub fn save_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    write_atomically(path, |writer| {
        serde_json::to_writer_pretty(&mut *writer, value)?;
        writer.write_all(b"\n").map_err(|e| DitongError::io(path, e))
    })
}

pub fn save_dictionary(dictionary: &Dictionary, path: &Path) -> Result<()> {
    save_json(dictionary, path)
}

/// Loads a dictionary file. Files that parse but break a model invariant
/// (mismatched keys, lengths or counts, sourceless words) are reported as
/// [`DitongError::InvalidFormat`].
pub fn load_dictionary(path: &Path) -> Result<Dictionary> {
    let file = File::open(path).map_err(|e| DitongError::io(path, e))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| {
        if e.is_data() {
            DitongError::invalid_format(path, e.to_string())
        } else {
            DitongError::Json(e)
        }
    })
}

/// Dictionary files under `root` in path order. Metadata files (leading `_`)
/// and anything below one of the `skip` paths are left out.
pub fn dictionary_files(root: &Path, skip: &[&Path]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !skip.iter().any(|skip| entry.path() == *skip));
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            DitongError::io(path, e.into())
        })?;
        let name = entry.file_name().to_string_lossy();
        if entry.file_type().is_file() && name.ends_with(".json") && !name.starts_with('_') {
            files.push(entry.path().to_path_buf());
        }
    }
    Ok(files)
}

#[derive(Serialize, Deserialize)]
struct PoolSnapshot {
    words: Vec<Word>,
}

/// Saves a word pool so later runs can build further views without ingesting again.
pub fn save_pool<'a, I>(words: I, path: &Path) -> Result<()>
where
    I: IntoIterator<Item = &'a Word>,
{
    let snapshot = PoolSnapshot { words: words.into_iter().cloned().collect() };
    write_atomically(path, |writer| {
        bincode::serialize_into(&mut *writer, &snapshot)?;
        Ok(())
    })
}

pub fn load_pool(path: &Path) -> Result<Vec<Word>> {
    let file = File::open(path).map_err(|e| DitongError::io(path, e))?;
    let reader = BufReader::new(file);
    let snapshot: PoolSnapshot = bincode::deserialize_from(reader)?;
    Ok(snapshot.words)
}
