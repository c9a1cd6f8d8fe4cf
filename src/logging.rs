//! Structured logging setup.
//!
//! Events go to stderr so resolved outcomes can be piped from stdout.
//! `RUST_LOG` overrides the default directives when set.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingOptions {
    /// Include per-search debug events
    pub verbose: bool,
    /// Plain, timestamped lines for tailing (progress bars are hidden)
    pub log_only: bool,
}

impl LoggingOptions {
    fn directives(&self) -> &'static str {
        if self.verbose {
            "tracklist_resolve=debug,warn"
        } else {
            "tracklist_resolve=info,warn"
        }
    }
}

pub fn init_logging(opts: LoggingOptions) -> Result<()> {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::new(opts.directives()));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(!opts.log_only)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_enables_debug() {
        let opts = LoggingOptions {
            verbose: true,
            ..Default::default()
        };
        assert!(opts.directives().contains("=debug"));
        assert!(LoggingOptions::default().directives().contains("=info"));
    }
}
