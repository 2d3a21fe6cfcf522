//! Directory scanning and the normalized-filename index.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::SyncError;
use crate::normalize::{is_reliable_key, normalize_key};

/// Accepted audio extension, compared case-insensitively.
pub const AUDIO_EXT: &str = "mp3";

/// Whether a filename carries the accepted audio extension.
pub fn is_audio_filename(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(AUDIO_EXT))
}

/// Mapping from normalized filename key to on-disk filename.
///
/// Backed by an ordered map so every consumer iterates keys in
/// lexicographic order; rebuilding the index from the same files always
/// yields the same matches regardless of directory listing order.
#[derive(Debug, Default)]
pub struct FileIndex {
    entries: BTreeMap<String, String>,
}

impl FileIndex {
    /// Scan `dir` for audio files and build the index.
    ///
    /// Filenames are sorted before insertion and the first (smallest)
    /// filename wins a key collision.
    pub fn scan(dir: &Path) -> Result<Self, SyncError> {
        let read = fs::read_dir(dir).map_err(|source| SyncError::Folder {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut names: Vec<String> = Vec::new();
        for entry in read {
            let entry = entry.map_err(|source| SyncError::Folder {
                path: dir.to_path_buf(),
                source,
            })?;
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if is_audio_filename(name) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort_unstable();

        let mut index = Self::default();
        for name in &names {
            index.add_file(name);
        }
        Ok(index)
    }

    /// Index one filename: normalize its stem and store it unless the key
    /// is too short to be reliable or already taken.
    pub fn add_file(&mut self, filename: &str) {
        let Some(stem) = Path::new(filename).file_stem().and_then(|s| s.to_str()) else {
            return;
        };
        let key = normalize_key(stem);
        if !is_reliable_key(&key) {
            return;
        }
        self.entries
            .entry(key)
            .or_insert_with(|| filename.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Entries in lexicographic key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
