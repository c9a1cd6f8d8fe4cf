//! Error taxonomy for tracklist resolution.
//!
//! Nothing here is fatal to a run: search errors are contained to a single
//! strategy attempt and invalid records are dropped by the caller.

use thiserror::Error;

/// Failure of one catalog search call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider error: {0}")]
    Provider(String),
    #[error("search timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("catalog index error: {0}")]
    Index(String),
}

impl From<rusqlite::Error> for SearchError {
    fn from(e: rusqlite::Error) -> Self {
        SearchError::Index(e.to_string())
    }
}

/// Scraped record rejected before it reaches the resolver
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackError {
    #[error("invalid track record #{source_index}: artist={artist:?} title={title:?}")]
    InvalidTrackRecord {
        source_index: usize,
        artist: String,
        title: String,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("acceptance threshold must be within [0, 1], got {0}")]
    Threshold(f64),
    #[error("{name} must be a finite, non-negative number of seconds, got {value}")]
    Delay { name: &'static str, value: f64 },
    #[error("max candidates must be at least 1")]
    MaxCandidates,
}
