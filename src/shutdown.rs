//! Signal-driven cancellation.
//!
//! The first signal only raises the shared flag, which the resolver checks
//! between tracks. A second signal while the flag is set exits the process.

use std::os::raw::c_int;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::flag;

/// Exit status used when a second signal forces shutdown
pub const FORCED_EXIT_CODE: i32 = 130;

/// Wire SIGINT and SIGTERM to a fresh cancellation flag
pub fn install_cancel_flag() -> Result<Arc<AtomicBool>> {
    let cancel = Arc::new(AtomicBool::new(false));
    register_cancel_signals(&[SIGINT, SIGTERM], &cancel)?;
    Ok(cancel)
}

/// Register `signals` against `cancel`.
///
/// The conditional shutdown is registered first so it sees the flag as it
/// was before this delivery: set only if an earlier signal already arrived.
pub fn register_cancel_signals(signals: &[c_int], cancel: &Arc<AtomicBool>) -> Result<()> {
    for &sig in signals {
        flag::register_conditional_shutdown(sig, FORCED_EXIT_CODE, Arc::clone(cancel))
            .with_context(|| format!("Failed to register forced shutdown for signal {sig}"))?;
        flag::register(sig, Arc::clone(cancel))
            .with_context(|| format!("Failed to register cancel handler for signal {sig}"))?;
    }
    Ok(())
}
