//! Liveness tracking for the mixer thread.

use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Holds the synchronizer's `running` flag high for as long as the mixer
/// thread body is on the stack, including while it unwinds.
pub(super) struct MixerThreadGuard {
    running: Arc<AtomicBool>,
    started: Instant,
}

impl MixerThreadGuard {
    pub(super) fn new(running: Arc<AtomicBool>) -> Self {
        running.store(true, Ordering::SeqCst);
        Self {
            running,
            started: Instant::now(),
        }
    }
}

impl Drop for MixerThreadGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        debug!(
            "mixer thread exited after {:.3}s",
            self.started.elapsed().as_secs_f64()
        );
    }
}
