//! Core data models for tracklist resolution.
//!
//! This module contains the track and candidate records that flow through
//! the dedup → search → score pipeline, plus the per-run statistics.

use serde::{Deserialize, Serialize};

use crate::errors::TrackError;
use crate::normalize::normalize_component;
use crate::strategy::QueryStage;

// ============================================================================
// Track Records
// ============================================================================

/// A scraped (artist, title) pair to be resolved.
///
/// Fields are private so a record cannot change after construction; use
/// [`TrackRecord::new`] which rejects records that normalize to nothing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TrackRecord {
    artist: String,
    title: String,
    source_index: usize,
}

impl TrackRecord {
    /// Build a record, trimming both fields.
    /// Fails with `InvalidTrackRecord` if either field is empty after normalization.
    pub fn new(
        artist: impl Into<String>,
        title: impl Into<String>,
        source_index: usize,
    ) -> Result<Self, TrackError> {
        let artist = artist.into().trim().to_string();
        let title = title.into().trim().to_string();

        if normalize_component(&artist).is_empty() || normalize_component(&title).is_empty() {
            return Err(TrackError::InvalidTrackRecord {
                source_index,
                artist,
                title,
            });
        }

        Ok(Self {
            artist,
            title,
            source_index,
        })
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Position of the record in the concatenated scraped input
    pub fn source_index(&self) -> usize {
        self.source_index
    }
}

// ============================================================================
// Catalog Models
// ============================================================================

/// One item of a catalog search response
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub catalog_id: String,
    pub artist: String,
    pub title: String,
}

impl CandidateResult {
    pub fn new(
        catalog_id: impl Into<String>,
        artist: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            catalog_id: catalog_id.into(),
            artist: artist.into(),
            title: title.into(),
        }
    }
}

/// Candidate with its confidence score against a track (0.0 to 1.0)
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredCandidate {
    pub candidate: CandidateResult,
    pub score: f64,
}

// ============================================================================
// Outcomes
// ============================================================================

/// Terminal status of one track's resolution
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchStatus {
    Matched {
        catalog_id: String,
        score: f64,
        /// Stage whose query produced the accepted candidate
        stage: QueryStage,
        /// Catalog display names, for operator reporting
        catalog_artist: String,
        catalog_title: String,
    },
    NotFound,
}

/// Resolver output for one unique track, handed to the playlist writer
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchOutcome {
    pub track: TrackRecord,
    #[serde(flatten)]
    pub status: MatchStatus,
    pub strategies_attempted: usize,
}

impl MatchOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self.status, MatchStatus::Matched { .. })
    }

    /// Catalog id for matched outcomes
    pub fn catalog_id(&self) -> Option<&str> {
        match &self.status {
            MatchStatus::Matched { catalog_id, .. } => Some(catalog_id),
            MatchStatus::NotFound => None,
        }
    }

    pub fn score(&self) -> Option<f64> {
        match &self.status {
            MatchStatus::Matched { score, .. } => Some(*score),
            MatchStatus::NotFound => None,
        }
    }
}

// ============================================================================
// Statistics (Instrumentation)
// ============================================================================

/// Per-run resolution statistics.
/// Extends the "tracks added / tracks not found" summary with per-stage counts.
#[derive(Default, Debug, Clone, Serialize)]
pub struct ResolutionStats {
    pub total_tracks: usize,
    pub matched: usize,
    pub not_found: usize,

    // Which stage produced each match
    pub matched_exact: usize,
    pub matched_quoted: usize,
    pub matched_title_only: usize,
    pub matched_artist_only: usize,

    // Search traffic
    pub search_calls: usize,
    pub search_failures: usize,
    pub search_retries: usize,
    /// Strategy attempts treated as empty after the retry also failed
    pub strategies_abandoned: usize,

    pub elapsed_seconds: f64,
}

impl ResolutionStats {
    /// Match rate as a percentage
    pub fn match_rate(&self) -> f64 {
        if self.total_tracks == 0 {
            0.0
        } else {
            100.0 * self.matched as f64 / self.total_tracks as f64
        }
    }

    /// `matched (rate%)`, as printed in the run summary
    pub fn matched_summary(&self) -> String {
        format!("{} ({:.1}%)", self.matched, self.match_rate())
    }

    /// Fold one outcome into the counters
    pub fn record_outcome(&mut self, outcome: &MatchOutcome) {
        self.total_tracks += 1;
        match &outcome.status {
            MatchStatus::Matched { stage, .. } => {
                self.matched += 1;
                match stage {
                    QueryStage::Exact => self.matched_exact += 1,
                    QueryStage::QuotedParts => self.matched_quoted += 1,
                    QueryStage::TitleOnly => self.matched_title_only += 1,
                    QueryStage::ArtistOnly => self.matched_artist_only += 1,
                }
            }
            MatchStatus::NotFound => self.not_found += 1,
        }
    }

    /// Write stats to a JSON file
    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_record_trims_fields() {
        let track = TrackRecord::new("  Artist ", " Title  ", 3).unwrap();
        assert_eq!(track.artist(), "Artist");
        assert_eq!(track.title(), "Title");
        assert_eq!(track.source_index(), 3);
    }

    #[test]
    fn test_track_record_rejects_empty_after_normalization() {
        assert!(TrackRecord::new("Artist", "", 0).is_err());
        assert!(TrackRecord::new("  ", "Title", 0).is_err());
        // Punctuation-only fields normalize to nothing
        assert!(TrackRecord::new("Artist", "?!", 0).is_err());
    }

    #[test]
    fn test_stats_match_rate() {
        let mut stats = ResolutionStats::default();
        assert_eq!(stats.match_rate(), 0.0);

        let track = TrackRecord::new("A", "T", 0).unwrap();
        stats.record_outcome(&MatchOutcome {
            track: track.clone(),
            status: MatchStatus::Matched {
                catalog_id: "1".into(),
                score: 0.9,
                stage: QueryStage::QuotedParts,
                catalog_artist: "A".into(),
                catalog_title: "T".into(),
            },
            strategies_attempted: 2,
        });
        stats.record_outcome(&MatchOutcome {
            track,
            status: MatchStatus::NotFound,
            strategies_attempted: 4,
        });

        assert_eq!(stats.total_tracks, 2);
        assert_eq!(stats.matched_quoted, 1);
        assert_eq!(stats.not_found, 1);
        assert_eq!(stats.match_rate(), 50.0);
        assert_eq!(stats.matched_summary(), "1 (50.0%)");
    }

    #[test]
    fn test_matched_summary_never_exceeds_full_rate() {
        let mut stats = ResolutionStats::default();
        assert_eq!(stats.matched_summary(), "0 (0.0%)");

        let track = TrackRecord::new("A", "T", 0).unwrap();
        for _ in 0..3 {
            stats.record_outcome(&MatchOutcome {
                track: track.clone(),
                status: MatchStatus::Matched {
                    catalog_id: "1".into(),
                    score: 1.0,
                    stage: QueryStage::Exact,
                    catalog_artist: "A".into(),
                    catalog_title: "T".into(),
                },
                strategies_attempted: 1,
            });
        }
        assert!(stats.match_rate() <= 100.0);
        assert_eq!(stats.matched_summary(), "3 (100.0%)");
    }

    #[test]
    fn test_outcome_serializes_flat_status() {
        let outcome = MatchOutcome {
            track: TrackRecord::new("A", "T", 0).unwrap(),
            status: MatchStatus::NotFound,
            strategies_attempted: 1,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "not_found");
        assert_eq!(json["track"]["artist"], "A");
    }
}
