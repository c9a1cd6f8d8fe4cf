//! Confidence scoring of catalog candidates against scraped tracks.
//!
//! The score is a weighted blend of title and artist similarity:
//!
//! ```text
//! score = 0.6 × title_similarity + 0.4 × artist_similarity
//! ```
//!
//! Titles weigh more because catalog artist credits vary widely (remixers,
//! "feat." ordering, split credits) while title strings are fairly stable.

use rustc_hash::FxHashSet;

use crate::models::{CandidateResult, ScoredCandidate, TrackRecord};
use crate::normalize::{extract_primary_artist, normalize_component};

// ============================================================================
// Weights
// ============================================================================

pub const TITLE_WEIGHT: f64 = 0.6;
pub const ARTIST_WEIGHT: f64 = 0.4;

/// Scores closer than this are treated as a tie
const SCORE_EPSILON: f64 = 1e-9;

/// Per-field breakdown of a candidate score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub title: f64,
    pub artist: f64,
    pub total: f64,
}

// ============================================================================
// Similarity
// ============================================================================

/// Jaccard similarity on word tokens of two normalized strings (0.0 to 1.0)
pub fn token_set_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let tokens_a: FxHashSet<&str> = a.split_whitespace().collect();
    let tokens_b: FxHashSet<&str> = b.split_whitespace().collect();

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();

    intersection as f64 / union as f64
}

/// Similarity of two raw field values (0.0 to 1.0).
///
/// An exact case-insensitive match is 1.0. Otherwise the better of token
/// overlap and normalized Levenshtein over the normalized strings, so both
/// reordered words and small spelling differences are tolerated.
pub fn field_similarity(a: &str, b: &str) -> f64 {
    if a.trim().to_lowercase() == b.trim().to_lowercase() {
        return 1.0;
    }

    let a_norm = normalize_component(a);
    let b_norm = normalize_component(b);
    normalized_similarity(&a_norm, &b_norm)
}

fn normalized_similarity(a_norm: &str, b_norm: &str) -> f64 {
    if a_norm.is_empty() || b_norm.is_empty() {
        return 0.0;
    }
    if a_norm == b_norm {
        return 1.0;
    }

    let tokens = token_set_similarity(a_norm, b_norm);
    let edits = strsim::normalized_levenshtein(a_norm, b_norm);
    tokens.max(edits)
}

/// Artist similarity, taking the best of full credits and primary artists.
/// A catalog often lists only the lead act of "Kx5 ft. HAYLA", or splits it as "Kx5, HAYLA".
pub fn artist_similarity(track_artist: &str, candidate_artist: &str) -> f64 {
    let full = field_similarity(track_artist, candidate_artist);
    if full >= 1.0 {
        return 1.0;
    }

    let track_full = normalize_component(track_artist);
    let candidate_full = normalize_component(candidate_artist);
    let track_primary = extract_primary_artist(track_artist);
    let candidate_primary = extract_primary_artist(candidate_artist);

    let track_names = std::iter::once(track_full.as_str()).chain(track_primary.as_deref());
    let mut best = full;
    for t in track_names {
        let candidate_names =
            std::iter::once(candidate_full.as_str()).chain(candidate_primary.as_deref());
        for c in candidate_names {
            best = best.max(normalized_similarity(t, c));
        }
    }
    best
}

// ============================================================================
// Combined Scoring
// ============================================================================

pub fn score_breakdown(track: &TrackRecord, candidate: &CandidateResult) -> ScoreBreakdown {
    let title = field_similarity(track.title(), &candidate.title);
    let artist = artist_similarity(track.artist(), &candidate.artist);
    let total = (TITLE_WEIGHT * title + ARTIST_WEIGHT * artist).clamp(0.0, 1.0);
    ScoreBreakdown { title, artist, total }
}

/// Confidence that `candidate` is `track`, clamped to [0, 1]
pub fn score(track: &TrackRecord, candidate: &CandidateResult) -> f64 {
    score_breakdown(track, candidate).total
}

/// Score every candidate and return the best one.
///
/// Ties go to the candidate whose title length is closest to the track's,
/// then to the earlier candidate in catalog order.
pub fn select_best(track: &TrackRecord, candidates: &[CandidateResult]) -> Option<ScoredCandidate> {
    let scored = candidates.iter().map(|candidate| ScoredCandidate {
        candidate: candidate.clone(),
        score: score(track, candidate),
    });
    best_of(track, scored)
}

pub(crate) fn best_of(
    track: &TrackRecord,
    scored: impl IntoIterator<Item = ScoredCandidate>,
) -> Option<ScoredCandidate> {
    let track_len = track.title().chars().count();
    let length_gap = |c: &ScoredCandidate| c.candidate.title.chars().count().abs_diff(track_len);

    let mut best: Option<ScoredCandidate> = None;
    for challenger in scored {
        let replace = match &best {
            None => true,
            Some(current) => {
                if challenger.score > current.score + SCORE_EPSILON {
                    true
                } else if (challenger.score - current.score).abs() <= SCORE_EPSILON {
                    length_gap(&challenger) < length_gap(current)
                } else {
                    false
                }
            }
        };
        if replace {
            best = Some(challenger);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(artist: &str, title: &str) -> TrackRecord {
        TrackRecord::new(artist, title, 0).unwrap()
    }

    fn candidate(id: &str, artist: &str, title: &str) -> CandidateResult {
        CandidateResult::new(id, artist, title)
    }

    #[test]
    fn test_exact_match_scores_one() {
        let t = track("Kx5 ft. HAYLA", "Escape (Spencer Brown Remix)");
        let c = candidate("1", "kx5 FT. hayla", "ESCAPE (Spencer Brown Remix)");
        assert_eq!(score(&t, &c), 1.0);
    }

    #[test]
    fn test_score_bounded() {
        let pairs = [
            ("A", "B", "", ""),
            ("Fisher", "Losing It", "Fisher", "Losing It (Extended Mix)"),
            ("Björk", "Army of Me", "Bjork", "Army Of Me"),
            ("Artist", "Title", "Completely", "Different Thing"),
            ("x", "y", "zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz", "!!!"),
        ];
        for (ta, tt, ca, ct) in pairs {
            let s = score(&track(ta, tt), &candidate("id", ca, ct));
            assert!((0.0..=1.0).contains(&s), "score {s} out of range for {ta} - {tt}");
        }
    }

    #[test]
    fn test_title_mismatch_penalized_more_than_artist_mismatch() {
        let t = track("Fisher", "Losing It");
        let wrong_title = score(&t, &candidate("1", "Fisher", "Take Control"));
        let wrong_artist = score(&t, &candidate("2", "Chris Lake", "Losing It"));
        assert!(wrong_artist > wrong_title);
    }

    #[test]
    fn test_primary_artist_rescues_split_credit() {
        let t = track("Kx5 ft. HAYLA", "Escape");
        let lead_only = score(&t, &candidate("1", "Kx5", "Escape"));
        assert!(lead_only >= 0.95, "lead-only credit scored {lead_only}");

        let split = artist_similarity("Kx5 ft. HAYLA", "Kx5, HAYLA");
        assert_eq!(split, 1.0);
    }

    #[test]
    fn test_token_set_similarity() {
        assert_eq!(token_set_similarity("a b", "a b"), 1.0);
        assert_eq!(token_set_similarity("a b", "b a"), 1.0);
        assert_eq!(token_set_similarity("a b", "c d"), 0.0);
        assert!((token_set_similarity("a b c", "a b") - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(token_set_similarity("", "a"), 0.0);
    }

    #[test]
    fn test_select_best_picks_highest() {
        let t = track("Fisher", "Losing It");
        let candidates = vec![
            candidate("1", "Someone", "Something Else"),
            candidate("2", "Fisher", "Losing It"),
            candidate("3", "Fisher", "Losing It (Extended Mix)"),
        ];
        let best = select_best(&t, &candidates).unwrap();
        assert_eq!(best.candidate.catalog_id, "2");
        assert_eq!(best.score, 1.0);
    }

    #[test]
    fn test_select_best_empty() {
        assert!(select_best(&track("A", "T"), &[]).is_none());
    }

    #[test]
    fn test_tie_break_prefers_closest_title_length() {
        let t = track("Fisher", "Losing It");
        let scored = vec![
            ScoredCandidate {
                candidate: candidate("long", "Fisher", "Losing It (Extended Mix)"),
                score: 0.8,
            },
            ScoredCandidate {
                candidate: candidate("close", "Fisher", "Losing It!"),
                score: 0.8,
            },
            ScoredCandidate {
                candidate: candidate("same-length", "Fisher", "Losing Up"),
                score: 0.8,
            },
        ];
        let best = best_of(&t, scored).unwrap();
        assert_eq!(best.candidate.catalog_id, "same-length");
    }

    #[test]
    fn test_tie_break_keeps_catalog_order_on_equal_length() {
        let t = track("A", "Title");
        let scored = vec![
            ScoredCandidate {
                candidate: candidate("first", "A", "Tytle"),
                score: 0.5,
            },
            ScoredCandidate {
                candidate: candidate("second", "A", "Tatle"),
                score: 0.5,
            },
        ];
        assert_eq!(best_of(&t, scored).unwrap().candidate.catalog_id, "first");
    }
}
