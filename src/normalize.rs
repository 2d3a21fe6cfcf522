//! Shared normalization for track names, artist names and filenames.
//!
//! Every comparison in the matcher goes through `normalize_key`, so the
//! function must stay deterministic and idempotent.

use any_ascii::any_ascii;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Shortest key length worth indexing; anything shorter carries too
/// little signal and produces spurious matches.
pub const MIN_KEY_LEN: usize = 3;

/// Matches a parenthesized span including the parentheses, e.g. "(Remastered 2011)".
static PARENTHETICAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)").unwrap());

/// Everything that is not a lowercase letter, digit or space.
static NON_KEY_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9 ]+").unwrap());

/// Regex to collapse runs of whitespace into a single space.
static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Check if a character is a Unicode combining mark (diacritical mark).
fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0xFE20..=0xFE2F)
}

/// Fold Unicode text to ASCII by applying NFKD decomposition and removing
/// combining marks, then transliterating whatever is left.
/// e.g., "Beyoncé" → "beyonce", "Motörhead" → "motorhead"
fn fold_to_ascii(s: &str) -> String {
    let stripped: String = s.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    any_ascii(&stripped).to_lowercase()
}

/// Canonicalize free text into a comparable key: NFKD decomposition,
/// parentheticals removed, transliterated to ASCII, lowercased, reduced to
/// `[a-z0-9 ]`, whitespace collapsed and trimmed.
///
/// Total over all inputs; the empty string maps to the empty string.
pub fn normalize_key(s: &str) -> String {
    let without_parens = PARENTHETICAL.replace_all(s, "");
    let folded = fold_to_ascii(&without_parens);
    let cleaned = NON_KEY_CHARS.replace_all(&folded, "");
    MULTI_SPACE.replace_all(cleaned.trim(), " ").to_string()
}

/// A key is reliable enough to index when it is longer than two characters.
pub fn is_reliable_key(key: &str) -> bool {
    key.len() >= MIN_KEY_LEN
}

/// The first artist of a ", "-joined multi-artist credit, raw (not normalized).
/// "Duck Sauce, A-Trak" → "Duck Sauce"
pub fn primary_artist(artist: &str) -> &str {
    artist.split(',').next().unwrap_or("").trim()
}
