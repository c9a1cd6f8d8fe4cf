//! Shared normalization functions for dedup keys and fuzzy matching.
//! Used by the deduplicator, the scorer and the artist-only containment filter.
//!
//! Any change here shifts dedup identity and match scores at the same time.

use any_ascii::any_ascii;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// Apostrophes are dropped rather than spaced so "Don't" keys as "dont"
pub static APOSTROPHE: Lazy<Regex> = Lazy::new(|| Regex::new(r"['`\u{00B4}]").unwrap());

/// Anything that is not a lowercase ASCII letter, digit or whitespace (applied after folding)
pub static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9\s]+").unwrap());

/// Regex to collapse runs of whitespace into a single space
pub static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Featuring / collaboration markers in an artist credit.
/// Matches: feat., ft., featuring, &, ",", and a standalone "x" ("Artist x Artist").
pub static COLLABORATION_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:\b(?:feat|ft)\b\.?|\bfeaturing\b|&|,|\s[x×]\s)").unwrap()
});

/// Multi-artist separator pattern for extracting the primary artist.
/// Matches: &, /, ,, •, +, ×, x, vs, and, with, feat, ft
pub static ARTIST_SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*(?:[&/,•+×]|(?:\s+(?:x|vs\.?|and|with|feat\.?|ft\.?|featuring)\s+))\s*")
        .unwrap()
});

// ============================================================================
// TEXT HELPERS
// ============================================================================

/// Check if a character is a Unicode combining mark (diacritical mark).
/// Used to filter out accents during normalization.
pub fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0xFE20..=0xFE2F)
}

/// Fold Unicode text to ASCII by applying NFKD decomposition and removing combining marks.
/// e.g., "Beyoncé" → "beyonce", "naïve" → "naive"
pub fn fold_to_ascii(s: &str) -> String {
    let stripped: String = s.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    // Transliterate whatever is left (Cyrillic, Hebrew, CJK, ...)
    any_ascii(&stripped).to_lowercase()
}

/// Convert curly quotes to straight quotes and collapse whitespace.
/// Scraped tracklists mix typographic and plain quotes freely.
pub fn normalize_punctuation(s: &str) -> String {
    let result = s
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2013}', '\u{2014}'], "-");
    MULTI_SPACE.replace_all(&result, " ").trim().to_string()
}

// ============================================================================
// NORMALIZATION FUNCTIONS
// ============================================================================

/// Normalize one artist or title field.
/// Lowercased, ASCII-folded, punctuation replaced by spaces, whitespace collapsed.
pub fn normalize_component(s: &str) -> String {
    let result = normalize_punctuation(s);
    let result = APOSTROPHE.replace_all(&result, "");
    let folded = fold_to_ascii(&result);
    let spaced = PUNCTUATION.replace_all(&folded, " ");
    MULTI_SPACE.replace_all(&spaced, " ").trim().to_string()
}

/// Dedup identity of an (artist, title) pair
pub fn dedupe_key(artist: &str, title: &str) -> String {
    format!("{}|{}", normalize_component(artist), normalize_component(title))
}

/// True when the artist credit names more than one act
pub fn has_collaboration_marker(artist: &str) -> bool {
    COLLABORATION_MARKER.is_match(artist)
}

/// Extract the primary (first) artist from a raw multi-artist credit, normalized.
/// Returns None if no separator found or the result would be empty.
/// e.g., "Kx5 ft. HAYLA" → Some("kx5")
///       "Duck Sauce, A-Trak & Armand Van Helden" → Some("duck sauce")
///       "Deadmau5" → None (no separator)
pub fn extract_primary_artist(artist: &str) -> Option<String> {
    let m = ARTIST_SEPARATOR.find(artist)?;
    let primary = normalize_component(&artist[..m.start()]);
    if primary.len() >= 2 {
        Some(primary)
    } else {
        None
    }
}

// ============================================================================
// TESTS
// ============================================================================
