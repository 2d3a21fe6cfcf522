//! Tiered matching of expected tracks against the on-disk file index.

use crate::index::FileIndex;
use crate::models::{MatchResult, MatchTier, TrackRecord};
use crate::normalize::{normalize_key, primary_artist};
use crate::similarity::{similarity, ACCEPT_THRESHOLD};

/// Resolve the best on-disk candidate for one track.
///
/// Tiers, in order: exact key match, substring containment (first hit in
/// key order), fuzzy scoring over the full artist+title key, and a
/// title-only fuzzy fallback restricted to file keys containing the
/// normalized first artist. The fallback runs whenever no earlier tier
/// reached the acceptance threshold and can only improve the running best.
///
/// Pure over its inputs; callers apply the acceptance rule to update state.
pub fn match_track(record: &TrackRecord, index: &FileIndex) -> MatchResult {
    let full_key = normalize_key(&format!("{} {}", record.artist, record.title));
    let title_key = normalize_key(&record.title);
    let artist_key = normalize_key(primary_artist(&record.artist));

    // 1) exact match on artist+title
    if let Some(file) = index.get(&full_key) {
        return MatchResult {
            filename: Some(file.to_string()),
            score: 1.0,
            tier: MatchTier::Exact,
        };
    }

    // 2) substring containment in either direction
    if !full_key.is_empty() {
        for (key, file) in index.iter() {
            if key.contains(&full_key) || full_key.contains(key) {
                return MatchResult {
                    filename: Some(file.to_string()),
                    score: 1.0,
                    tier: MatchTier::Substring,
                };
            }
        }
    }

    // 3) fuzzy over the full key; strictly-greater keeps ties on the
    //    lexicographically first key
    let mut best = MatchResult::none();
    for (key, file) in index.iter() {
        let score = similarity(&full_key, key);
        if score > best.score {
            best = MatchResult {
                filename: Some(file.to_string()),
                score,
                tier: MatchTier::FuzzyFullKey,
            };
        }
    }

    // 4) title-only fallback, only among files naming the first artist.
    //    An empty artist key would match every file and defeat the guard.
    if best.score < ACCEPT_THRESHOLD && !artist_key.is_empty() {
        for (key, file) in index.iter() {
            if !key.contains(&artist_key) {
                continue;
            }
            let score = similarity(&title_key, key);
            if score > best.score {
                best = MatchResult {
                    filename: Some(file.to_string()),
                    score,
                    tier: MatchTier::FuzzyTitle,
                };
            }
        }
    }

    best
}
