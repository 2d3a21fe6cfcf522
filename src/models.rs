//! Core data models for playlist/disk reconciliation.

use serde::{Deserialize, Serialize};

use crate::normalize::normalize_key;
use crate::similarity::ACCEPT_THRESHOLD;

/// One playlist entry, as persisted in the state file.
///
/// `artist` may join several credited artists with ", "; the first one is
/// the identity used by the matcher's title-only fallback. Records are
/// never deleted, only appended, and `downloaded` is only mutated through
/// the reconciliation path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub downloaded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

impl TrackRecord {
    /// Merge identity: the normalized (artist, title, album) triple.
    pub fn identity(&self) -> (String, String, String) {
        (
            normalize_key(&self.artist),
            normalize_key(&self.title),
            normalize_key(&self.album),
        )
    }

    /// Search query handed to the acquisition collaborator.
    pub fn query(&self) -> String {
        format!("{} - {}", self.artist, self.title)
    }
}

/// How a track was resolved to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    /// Normalized artist+title key equals a file key.
    Exact,
    /// One key contains the other.
    Substring,
    /// Best fuzzy score over the full artist+title key.
    FuzzyFullKey,
    /// Title-only fuzzy fallback among files naming the first artist.
    FuzzyTitle,
    /// No candidate at all.
    NoMatch,
}

/// Outcome of matching one track against the file index. Ephemeral;
/// consumed immediately to update the record's `downloaded` flag.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub filename: Option<String>,
    pub score: f64,
    pub tier: MatchTier,
}

impl MatchResult {
    pub fn none() -> Self {
        Self {
            filename: None,
            score: 0.0,
            tier: MatchTier::NoMatch,
        }
    }

    /// Acceptance rule: a candidate exists and scores at or above the
    /// threshold.
    pub fn accepted(&self) -> bool {
        self.filename.is_some() && self.score >= ACCEPT_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, artist: &str, album: &str) -> TrackRecord {
        TrackRecord {
            title: title.to_string(),
            artist: artist.to_string(),
            album: album.to_string(),
            downloaded: false,
            cover_url: None,
        }
    }

    #[test]
    fn test_identity_is_normalized() {
        let a = record("Jóga (Remastered)", "Björk", "Homogenic");
        let b = record("Joga", "bjork", "homogenic!");
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn test_query_format() {
        let r = record("Song Title", "Artist", "Album");
        assert_eq!(r.query(), "Artist - Song Title");
    }

    #[test]
    fn test_acceptance_threshold_boundary() {
        let mut result = MatchResult {
            filename: Some("file.mp3".to_string()),
            score: 0.90,
            tier: MatchTier::FuzzyFullKey,
        };
        assert!(result.accepted());

        result.score = 0.899999;
        assert!(!result.accepted());
    }

    #[test]
    fn test_no_file_never_accepted() {
        let result = MatchResult {
            filename: None,
            score: 1.0,
            tier: MatchTier::NoMatch,
        };
        assert!(!result.accepted());
    }

    #[test]
    fn test_cover_url_omitted_when_absent() {
        let r = record("T", "A", "B");
        let json = serde_json::to_string(&r).unwrap();
        assert!(!json.contains("cover_url"));
    }
}
