//! Minimum-spacing gate in front of every catalog search call.
//!
//! One instance is created per run and handed to the resolver. It is the
//! only shared mutable state in the engine.

use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

#[derive(Debug)]
struct GateState {
    /// When the previous `acquire` returned
    last: Option<Instant>,
    rng: SmallRng,
}

/// Blocks callers so that consecutive `acquire` calls return at least
/// `min_interval` (plus optional jitter) apart.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    jitter: Duration,
    state: Mutex<GateState>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self::with_jitter(min_interval, Duration::ZERO)
    }

    /// Each wait window is extended by a uniform random amount in `[0, jitter]`
    pub fn with_jitter(min_interval: Duration, jitter: Duration) -> Self {
        Self {
            min_interval,
            jitter,
            state: Mutex::new(GateState {
                last: None,
                rng: SmallRng::from_entropy(),
            }),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until the spacing window since the previous acquire has passed.
    /// The first call returns immediately.
    pub fn acquire(&self) {
        // A panic while holding the lock leaves the timestamp intact, so keep going
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(last) = state.last {
            let window = self.min_interval + self.sample_jitter(&mut state.rng);
            let elapsed = last.elapsed();
            if elapsed < window {
                let wait = window - elapsed;
                tracing::trace!(wait_ms = wait.as_millis() as u64, "rate_limit.wait");
                thread::sleep(wait);
            }
        }

        state.last = Some(Instant::now());
    }

    fn sample_jitter(&self, rng: &mut SmallRng) -> Duration {
        if self.jitter.is_zero() {
            return Duration::ZERO;
        }
        let max_ms = self.jitter.as_millis() as u64;
        Duration::from_millis(rng.gen_range(0..=max_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_acquire_does_not_wait() {
        let limiter = RateLimiter::new(Duration::from_secs(5));
        let start = Instant::now();
        limiter.acquire();
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_enforces_minimum_spacing() {
        let delay = Duration::from_millis(30);
        let limiter = RateLimiter::new(delay);
        let n = 5;

        let start = Instant::now();
        for _ in 0..n {
            limiter.acquire();
        }
        assert!(start.elapsed() >= delay * (n - 1));
    }

    #[test]
    fn test_jitter_only_lengthens_spacing() {
        let delay = Duration::from_millis(20);
        let limiter = RateLimiter::with_jitter(delay, Duration::from_millis(10));

        let start = Instant::now();
        for _ in 0..4 {
            limiter.acquire();
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= delay * 3);
    }

    #[test]
    fn test_zero_delay_never_blocks() {
        let limiter = RateLimiter::new(Duration::ZERO);
        let start = Instant::now();
        for _ in 0..100 {
            limiter.acquire();
        }
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_shared_across_threads() {
        use std::sync::Arc;

        let delay = Duration::from_millis(20);
        let limiter = Arc::new(RateLimiter::new(delay));
        let start = Instant::now();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                thread::spawn(move || limiter.acquire())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(start.elapsed() >= delay * 3);
    }
}
