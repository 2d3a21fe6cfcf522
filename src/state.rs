//! Persisted reconciliation state: load, save, catalog merge and the
//! match reducer.
//!
//! The state file is the durable source of truth: a JSON array of track
//! records, read at startup and overwritten wholesale after every
//! state-changing operation. Merging and reducing are pure functions so
//! the update logic stays auditable; only the caller performs I/O.

use std::fs;
use std::path::Path;

use rustc_hash::FxHashMap;

use crate::error::SyncError;
use crate::index::FileIndex;
use crate::matcher::match_track;
use crate::models::{MatchResult, TrackRecord};

/// Load the persisted records. A missing file is an empty state.
pub fn load(path: &Path) -> Result<Vec<TrackRecord>, SyncError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(path).map_err(|e| SyncError::State {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&text).map_err(|e| SyncError::State {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Overwrite the state file with the full record sequence.
pub fn save(path: &Path, records: &[TrackRecord]) -> Result<(), SyncError> {
    let json = serde_json::to_string_pretty(records).map_err(|e| SyncError::State {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    fs::write(path, json).map_err(|e| SyncError::State {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// What a catalog merge did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub added: usize,
    pub covers_filled: usize,
}

impl MergeOutcome {
    pub fn changed(&self) -> bool {
        self.added > 0 || self.covers_filled > 0
    }
}

/// Merge freshly fetched catalog records into the existing sequence.
///
/// Identity is the normalized (artist, title, album) triple. `downloaded`
/// is monotone across merges: a refresh never resets it. A refresh can
/// only append new records (with `downloaded = false`) or fill a
/// previously absent cover URL.
pub fn merge_catalog(
    existing: &[TrackRecord],
    fetched: &[TrackRecord],
) -> (Vec<TrackRecord>, MergeOutcome) {
    let mut merged: Vec<TrackRecord> = existing.to_vec();
    let mut by_identity: FxHashMap<(String, String, String), usize> = merged
        .iter()
        .enumerate()
        .map(|(i, r)| (r.identity(), i))
        .collect();

    let mut outcome = MergeOutcome::default();
    for record in fetched {
        match by_identity.get(&record.identity()) {
            Some(&i) => {
                if merged[i].cover_url.is_none() && record.cover_url.is_some() {
                    merged[i].cover_url = record.cover_url.clone();
                    outcome.covers_filled += 1;
                }
            }
            None => {
                by_identity.insert(record.identity(), merged.len());
                merged.push(TrackRecord {
                    downloaded: false,
                    ..record.clone()
                });
                outcome.added += 1;
            }
        }
    }
    (merged, outcome)
}

/// Run the matcher over every record against the index.
pub fn reconcile(records: &[TrackRecord], index: &FileIndex) -> Vec<MatchResult> {
    records.iter().map(|r| match_track(r, index)).collect()
}

/// Pure reducer: fold match results into the records' `downloaded` flags.
///
/// Returns the updated sequence and whether any flag changed; callers
/// persist only when it did, avoiding redundant writes.
pub fn apply_matches(
    records: &[TrackRecord],
    results: &[MatchResult],
) -> (Vec<TrackRecord>, bool) {
    debug_assert_eq!(records.len(), results.len());
    let mut updated = records.to_vec();
    let mut changed = false;
    for (record, result) in updated.iter_mut().zip(results) {
        let on_disk = result.accepted();
        if record.downloaded != on_disk {
            record.downloaded = on_disk;
            changed = true;
        }
    }
    (updated, changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchTier;
    use tempfile::tempdir;

    fn record(artist: &str, title: &str, downloaded: bool) -> TrackRecord {
        TrackRecord {
            title: title.to_string(),
            artist: artist.to_string(),
            album: "Album".to_string(),
            downloaded,
            cover_url: None,
        }
    }

    fn hit(file: &str, score: f64) -> MatchResult {
        MatchResult {
            filename: Some(file.to_string()),
            score,
            tier: MatchTier::FuzzyFullKey,
        }
    }

    #[test]
    fn test_load_absent_file_is_empty_state() {
        let dir = tempdir().unwrap();
        let records = load(&dir.path().join("state.json")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let records = vec![
            record("Artist", "One", true),
            TrackRecord {
                cover_url: Some("https://example.com/c.jpg".to_string()),
                ..record("Artist", "Two", false)
            },
        ];
        save(&path, &records).unwrap();
        assert_eq!(load(&path).unwrap(), records);
    }

    #[test]
    fn test_load_rejects_malformed_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(load(&path).is_err());
    }

    #[test]
    fn test_merge_appends_new_records_not_downloaded() {
        let existing = vec![record("A", "One", true)];
        let fetched = vec![
            record("A", "One", false),
            TrackRecord {
                downloaded: true, // catalog data never dictates the flag
                ..record("B", "Two", false)
            },
        ];
        let (merged, outcome) = merge_catalog(&existing, &fetched);
        assert_eq!(outcome, MergeOutcome { added: 1, covers_filled: 0 });
        assert_eq!(merged.len(), 2);
        assert!(!merged[1].downloaded);
    }

    #[test]
    fn test_merge_is_monotone_on_downloaded() {
        let existing = vec![record("A", "One", true)];
        let fetched = vec![record("A", "One", false)];
        let (merged, outcome) = merge_catalog(&existing, &fetched);
        assert!(merged[0].downloaded);
        assert!(!outcome.changed());
    }

    #[test]
    fn test_merge_identity_ignores_formatting() {
        let existing = vec![record("Björk", "Jóga", true)];
        let fetched = vec![record("bjork", "joga!", false)];
        let (merged, outcome) = merge_catalog(&existing, &fetched);
        assert_eq!(merged.len(), 1);
        assert_eq!(outcome.added, 0);
    }

    #[test]
    fn test_merge_fills_missing_cover_only() {
        let existing = vec![
            record("A", "One", false),
            TrackRecord {
                cover_url: Some("https://example.com/old.jpg".to_string()),
                ..record("B", "Two", false)
            },
        ];
        let fetched = vec![
            TrackRecord {
                cover_url: Some("https://example.com/one.jpg".to_string()),
                ..record("A", "One", false)
            },
            TrackRecord {
                cover_url: Some("https://example.com/new.jpg".to_string()),
                ..record("B", "Two", false)
            },
        ];
        let (merged, outcome) = merge_catalog(&existing, &fetched);
        assert_eq!(outcome, MergeOutcome { added: 0, covers_filled: 1 });
        assert_eq!(
            merged[0].cover_url.as_deref(),
            Some("https://example.com/one.jpg")
        );
        assert_eq!(
            merged[1].cover_url.as_deref(),
            Some("https://example.com/old.jpg")
        );
    }

    #[test]
    fn test_apply_matches_flags_changes() {
        let records = vec![record("A", "One", false), record("B", "Two", true)];
        let results = vec![hit("one.mp3", 0.95), hit("two.mp3", 0.80)];
        let (updated, changed) = apply_matches(&records, &results);
        assert!(changed);
        assert!(updated[0].downloaded);
        assert!(!updated[1].downloaded);
    }

    #[test]
    fn test_apply_matches_reports_no_change() {
        let records = vec![record("A", "One", true), record("B", "Two", false)];
        let results = vec![hit("one.mp3", 1.0), MatchResult::none()];
        let (updated, changed) = apply_matches(&records, &results);
        assert!(!changed);
        assert_eq!(updated, records);
    }
}
