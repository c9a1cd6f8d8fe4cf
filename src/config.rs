//! Resolver configuration.
//!
//! Fast and thorough runs use the same engine; a `Mode` only selects the
//! acceptance threshold and the spacing between catalog calls.

use std::time::Duration;

use clap::ValueEnum;
use serde::Serialize;

use crate::errors::ConfigError;
use crate::rate_limit::RateLimiter;

/// Leading results of each search that are scored
pub const DEFAULT_MAX_CANDIDATES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Stricter threshold, short delay between searches
    Fast,
    /// Looser threshold, longer jittered delay for better coverage
    Thorough,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolverConfig {
    /// Minimum confidence score required to accept a candidate
    pub acceptance_threshold: f64,
    /// Minimum spacing between catalog search calls
    pub inter_call_delay: Duration,
    /// Extra random spacing in `[0, jitter]` added per call
    pub jitter: Duration,
    /// Only this many leading results of each search are scored
    pub max_candidates: usize,
}

impl ResolverConfig {
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Fast => Self {
                acceptance_threshold: 0.40,
                inter_call_delay: Duration::from_millis(150),
                jitter: Duration::ZERO,
                max_candidates: DEFAULT_MAX_CANDIDATES,
            },
            Mode::Thorough => Self {
                acceptance_threshold: 0.30,
                inter_call_delay: Duration::from_millis(500),
                jitter: Duration::from_millis(250),
                max_candidates: DEFAULT_MAX_CANDIDATES,
            },
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.acceptance_threshold = threshold;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.inter_call_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.acceptance_threshold) {
            return Err(ConfigError::Threshold(self.acceptance_threshold));
        }
        if self.max_candidates == 0 {
            return Err(ConfigError::MaxCandidates);
        }
        Ok(())
    }

    /// Rate limiter matching this configuration's spacing
    pub fn rate_limiter(&self) -> RateLimiter {
        RateLimiter::with_jitter(self.inter_call_delay, self.jitter)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::for_mode(Mode::Fast)
    }
}

/// Parse a delay given in (fractional) seconds, as the CLI accepts them
pub fn parse_seconds(name: &'static str, value: f64) -> Result<Duration, ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Delay { name, value });
    }
    Ok(Duration::from_secs_f64(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modes_differ_only_in_constants() {
        let fast = ResolverConfig::for_mode(Mode::Fast);
        let thorough = ResolverConfig::for_mode(Mode::Thorough);

        assert_eq!(fast.acceptance_threshold, 0.40);
        assert_eq!(thorough.acceptance_threshold, 0.30);
        assert!(fast.inter_call_delay < thorough.inter_call_delay);
        assert_eq!(fast.max_candidates, thorough.max_candidates);
        assert!(fast.validate().is_ok());
        assert!(thorough.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert_eq!(
            ResolverConfig::default().with_threshold(1.5).validate(),
            Err(ConfigError::Threshold(1.5))
        );
        assert!(ResolverConfig::default().with_threshold(f64::NAN).validate().is_err());
        assert_eq!(
            ResolverConfig::default().with_max_candidates(0).validate(),
            Err(ConfigError::MaxCandidates)
        );
    }

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds("delay", 0.25).unwrap(), Duration::from_millis(250));
        assert!(parse_seconds("delay", -1.0).is_err());
        assert!(parse_seconds("delay", f64::INFINITY).is_err());
    }
}
