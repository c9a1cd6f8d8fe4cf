//! Query escalation for catalog search.
//!
//! Each track gets a fixed, deterministic sequence of at most four queries,
//! each looser than the one before. The resolver walks the sequence and
//! stops at the first stage that yields an acceptable candidate, so later
//! stages only cost a search call when earlier ones came up empty.

use std::fmt;

use serde::Serialize;

use crate::models::TrackRecord;
use crate::normalize::has_collaboration_marker;

/// Upper bound on queries per track
pub const MAX_STRATEGIES: usize = 4;

/// Wide stages (title-only, artist-only) shorter than this are too generic to be worth a call
pub const MIN_WIDE_QUERY_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStage {
    /// `{artist} - {title}`
    Exact,
    /// `"{artist}" "{title}"`, for catalogs that tokenize multi-word artists differently
    QuotedParts,
    /// `{title}`, only for collaboration credits the catalog may split up
    TitleOnly,
    /// `{artist}`, with returned titles filtered client-side by containment
    ArtistOnly,
}

impl QueryStage {
    /// Whether candidates from this stage must be intersected against the track title
    pub fn filters_by_title(self) -> bool {
        matches!(self, QueryStage::ArtistOnly)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QueryStage::Exact => "exact",
            QueryStage::QuotedParts => "quoted_parts",
            QueryStage::TitleOnly => "title_only",
            QueryStage::ArtistOnly => "artist_only",
        }
    }
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One search formulation for a track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub stage: QueryStage,
    pub text: String,
}

impl Query {
    fn new(stage: QueryStage, text: String) -> Self {
        Self { stage, text }
    }
}

/// Build the ordered query sequence for a track.
///
/// Always contains the exact and quoted stages; title-only is added for
/// collaboration credits and artist-only as the last resort, unless either
/// would be too short to be specific.
pub fn strategies(track: &TrackRecord) -> Vec<Query> {
    let artist = track.artist();
    let title = track.title();

    let mut queries = Vec::with_capacity(MAX_STRATEGIES);
    queries.push(Query::new(QueryStage::Exact, format!("{artist} - {title}")));
    queries.push(Query::new(
        QueryStage::QuotedParts,
        format!("\"{artist}\" \"{title}\""),
    ));

    if has_collaboration_marker(artist) && is_specific(title) {
        queries.push(Query::new(QueryStage::TitleOnly, title.to_string()));
    }

    if is_specific(artist) {
        queries.push(Query::new(QueryStage::ArtistOnly, artist.to_string()));
    }

    debug_assert!(!queries.is_empty() && queries.len() <= MAX_STRATEGIES);
    queries
}

fn is_specific(query: &str) -> bool {
    query.trim().chars().count() >= MIN_WIDE_QUERY_LEN
}
