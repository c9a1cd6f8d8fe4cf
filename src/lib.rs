//! Tracklist resolution library: deduplicates scraped `ARTIST - TITLE`
//! entries and resolves each unique track to a catalog identifier through
//! escalating, rate-limited fuzzy search.

pub mod catalog;
pub mod config;
pub mod dedupe;
pub mod errors;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod rate_limit;
pub mod resolver;
pub mod safety;
pub mod scoring;
pub mod shutdown;
pub mod strategy;
pub mod tracklist;

pub use catalog::{SearchCatalog, SqliteCatalog};
pub use config::{Mode, ResolverConfig};
pub use dedupe::dedupe;
pub use models::{CandidateResult, MatchOutcome, MatchStatus, ResolutionStats, TrackRecord};
pub use rate_limit::RateLimiter;
pub use resolver::{ResolutionRun, Resolver};
