//! Match resolution: drives query escalation, rate-limited search and
//! scoring for each unique track.
//!
//! Per track the resolver walks a small state machine:
//!
//! ```text
//! Pending → Searching(i) → Scoring → Matched
//!                ↑             │
//!                └── i + 1 ────┤
//!                              └→ Exhausted → NotFound
//! ```
//!
//! A failed search is retried once for the same query; a second failure
//! counts as zero candidates and the next query runs. One track's failures
//! never stop the rest of the run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::catalog::SearchCatalog;
use crate::config::ResolverConfig;
use crate::models::{CandidateResult, MatchOutcome, MatchStatus, ResolutionStats, ScoredCandidate, TrackRecord};
use crate::normalize::normalize_component;
use crate::progress::{create_progress_bar, log_progress};
use crate::rate_limit::RateLimiter;
use crate::scoring::select_best;
use crate::strategy::{strategies, Query};

/// Extra attempts for a failed search before its query counts as empty
pub const SEARCH_RETRIES: usize = 1;

#[derive(Debug)]
enum ResolveState {
    Pending,
    Searching(usize),
    Scoring {
        index: usize,
        candidates: Vec<CandidateResult>,
    },
    Matched {
        index: usize,
        best: ScoredCandidate,
    },
    Exhausted,
}

/// Outcomes of a full run, in deduplicated order
#[derive(Debug)]
pub struct ResolutionRun {
    pub outcomes: Vec<MatchOutcome>,
    pub stats: ResolutionStats,
    /// True if the run stopped early on a cancellation request
    pub cancelled: bool,
}

impl ResolutionRun {
    pub fn not_found(&self) -> impl Iterator<Item = &MatchOutcome> {
        self.outcomes.iter().filter(|o| !o.is_matched())
    }
}

pub struct Resolver<'a, C: SearchCatalog> {
    catalog: C,
    limiter: &'a RateLimiter,
    config: ResolverConfig,
}

impl<'a, C: SearchCatalog> Resolver<'a, C> {
    /// The limiter is shared by every search this resolver issues; callers
    /// pass the run's single instance.
    pub fn new(catalog: C, limiter: &'a RateLimiter, config: ResolverConfig) -> Self {
        Self {
            catalog,
            limiter,
            config,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve one track
    pub fn resolve(&self, track: &TrackRecord) -> MatchOutcome {
        let mut stats = ResolutionStats::default();
        self.resolve_with_stats(track, &mut stats)
    }

    /// Resolve one track, adding its search traffic to `stats`.
    /// Outcome counters are left to the caller.
    pub fn resolve_with_stats(&self, track: &TrackRecord, stats: &mut ResolutionStats) -> MatchOutcome {
        let queries = strategies(track);
        let mut attempted = 0;
        let mut state = ResolveState::Pending;

        loop {
            state = match state {
                ResolveState::Pending => ResolveState::Searching(0),

                ResolveState::Searching(index) => {
                    let query = &queries[index];
                    attempted += 1;
                    let candidates = self.search_with_retry(query, stats);
                    ResolveState::Scoring { index, candidates }
                }

                ResolveState::Scoring { index, candidates } => {
                    let query = &queries[index];
                    let candidates = self.shortlist(track, query, candidates);
                    match select_best(track, &candidates) {
                        Some(best) if best.score >= self.config.acceptance_threshold => {
                            ResolveState::Matched { index, best }
                        }
                        best => {
                            debug!(
                                stage = %query.stage,
                                candidates = candidates.len(),
                                best_score = best.map(|b| b.score),
                                "resolve.stage_rejected"
                            );
                            if index + 1 < queries.len() {
                                ResolveState::Searching(index + 1)
                            } else {
                                ResolveState::Exhausted
                            }
                        }
                    }
                }

                ResolveState::Matched { index, best } => {
                    let stage = queries[index].stage;
                    info!(
                        artist = track.artist(),
                        title = track.title(),
                        catalog_id = %best.candidate.catalog_id,
                        score = format!("{:.2}", best.score),
                        %stage,
                        "resolve.matched"
                    );
                    return MatchOutcome {
                        track: track.clone(),
                        status: MatchStatus::Matched {
                            catalog_id: best.candidate.catalog_id,
                            score: best.score,
                            stage,
                            catalog_artist: best.candidate.artist,
                            catalog_title: best.candidate.title,
                        },
                        strategies_attempted: attempted,
                    };
                }

                ResolveState::Exhausted => {
                    warn!(
                        artist = track.artist(),
                        title = track.title(),
                        strategies = attempted,
                        "resolve.not_found"
                    );
                    return MatchOutcome {
                        track: track.clone(),
                        status: MatchStatus::NotFound,
                        strategies_attempted: attempted,
                    };
                }
            };
        }
    }

    /// Resolve tracks strictly one at a time, in order.
    ///
    /// `cancel` is checked between tracks only; a track whose search has
    /// started always runs to its outcome.
    pub fn resolve_all(&self, tracks: &[TrackRecord], cancel: &AtomicBool) -> ResolutionRun {
        let start = Instant::now();
        let mut stats = ResolutionStats::default();
        let mut outcomes = Vec::with_capacity(tracks.len());
        let mut cancelled = false;

        let total = tracks.len() as u64;
        let pb = create_progress_bar(total, "Resolving tracks");

        for (i, track) in tracks.iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                warn!(resolved = i, remaining = tracks.len() - i, "resolve.cancelled");
                cancelled = true;
                break;
            }

            let outcome = self.resolve_with_stats(track, &mut stats);
            stats.record_outcome(&outcome);
            outcomes.push(outcome);

            pb.inc(1);
            log_progress("resolve", i as u64 + 1, total, 25);
        }

        stats.elapsed_seconds = start.elapsed().as_secs_f64();
        pb.finish_with_message(format!(
            "Resolved {} tracks ({} matched)",
            outcomes.len(),
            stats.matched
        ));

        ResolutionRun {
            outcomes,
            stats,
            cancelled,
        }
    }

    /// Rate-limited search with a single immediate retry.
    /// A second failure is logged and treated as an empty result.
    fn search_with_retry(&self, query: &Query, stats: &mut ResolutionStats) -> Vec<CandidateResult> {
        for attempt in 0..=SEARCH_RETRIES {
            self.limiter.acquire();
            stats.search_calls += 1;

            match self.catalog.search(&query.text) {
                Ok(candidates) => {
                    debug!(stage = %query.stage, query = %query.text, results = candidates.len(), "search.ok");
                    return candidates;
                }
                Err(e) => {
                    stats.search_failures += 1;
                    warn!(stage = %query.stage, query = %query.text, attempt, error = %e, "search.failed");
                    if attempt < SEARCH_RETRIES {
                        stats.search_retries += 1;
                    }
                }
            }
        }

        stats.strategies_abandoned += 1;
        Vec::new()
    }

    /// Apply the stage's client-side filter and keep the leading results
    fn shortlist(
        &self,
        track: &TrackRecord,
        query: &Query,
        candidates: Vec<CandidateResult>,
    ) -> Vec<CandidateResult> {
        let limit = self.config.max_candidates;
        if !query.stage.filters_by_title() {
            return candidates.into_iter().take(limit).collect();
        }

        let track_title = normalize_component(track.title());
        candidates
            .into_iter()
            .filter(|c| titles_overlap(&track_title, &normalize_component(&c.title)))
            .take(limit)
            .collect()
    }
}

/// Containment in either direction between normalized titles, on whole words.
/// Normalized titles are single-space separated, so padding both sides with
/// a space anchors the match at word boundaries.
fn titles_overlap(track_title: &str, candidate_title: &str) -> bool {
    if track_title.is_empty() || candidate_title.is_empty() {
        return false;
    }
    let track = format!(" {track_title} ");
    let candidate = format!(" {candidate_title} ");
    candidate.contains(&track) || track.contains(&candidate)
}
