//! Collapse scraped tracklists into a unique, first-seen-ordered working set.

use rustc_hash::FxHashSet;

use crate::models::TrackRecord;
use crate::normalize::dedupe_key;

/// Result of a dedup pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deduplication {
    pub tracks: Vec<TrackRecord>,
    /// Later duplicates that were dropped
    pub discarded: usize,
}

/// Deduplicate by normalized artist + title, keeping the first occurrence.
pub fn dedupe(records: Vec<TrackRecord>) -> Vec<TrackRecord> {
    dedupe_with_report(records).tracks
}

/// Same as [`dedupe`] but also reports how many duplicates were discarded.
pub fn dedupe_with_report(records: Vec<TrackRecord>) -> Deduplication {
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut tracks = Vec::with_capacity(records.len());
    let mut discarded = 0;

    for record in records {
        if seen.insert(dedupe_key(record.artist(), record.title())) {
            tracks.push(record);
        } else {
            discarded += 1;
        }
    }

    tracing::debug!(unique = tracks.len(), discarded, "dedupe.done");
    Deduplication { tracks, discarded }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(artist: &str, title: &str, idx: usize) -> TrackRecord {
        TrackRecord::new(artist, title, idx).unwrap()
    }

    #[test]
    fn test_dedupe_empty() {
        let result = dedupe_with_report(Vec::new());
        assert!(result.tracks.is_empty());
        assert_eq!(result.discarded, 0);
    }

    #[test]
    fn test_dedupe_preserves_first_seen_order() {
        let input = vec![track("A", "T1", 0), track("B", "T2", 1), track("A", "T1", 2)];
        let result = dedupe_with_report(input);

        assert_eq!(result.discarded, 1);
        let pairs: Vec<(&str, &str, usize)> = result
            .tracks
            .iter()
            .map(|t| (t.artist(), t.title(), t.source_index()))
            .collect();
        assert_eq!(pairs, vec![("A", "T1", 0), ("B", "T2", 1)]);
    }

    #[test]
    fn test_dedupe_case_and_whitespace_insensitive() {
        let input = vec![track("Artist", "Title", 0), track(" artist ", "title ", 1)];
        let result = dedupe(input);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].source_index(), 0);
    }

    #[test]
    fn test_dedupe_punctuation_insensitive() {
        let input = vec![
            track("Kx5 ft. HAYLA", "Escape (Spencer Brown Remix)", 0),
            track("KX5 ft HAYLA", "Escape - Spencer Brown Remix", 1),
            track("Beyoncé", "Halo", 2),
            track("Beyonce", "Halo", 3),
        ];
        assert_eq!(dedupe(input).len(), 2);
    }

    #[test]
    fn test_dedupe_idempotent() {
        let input = vec![
            track("A", "T1", 0),
            track("a", "t1", 1),
            track("B", "T2", 2),
            track("C", "T3", 3),
            track("B", "T2!", 4),
        ];
        let once = dedupe(input);
        let twice = dedupe(once.clone());
        assert_eq!(once, twice);
        assert_eq!(once.len(), 3);
    }
}
