//! Counters shared by the channel sinks and the mixer loop.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::channel::Side;

#[derive(Debug, Default)]
pub struct MixerStats {
    frames: AtomicU64,
    sample_pairs: AtomicU64,
    gaps: AtomicU64,
    silence_fills: AtomicU64,
    overflow_left: AtomicU64,
    overflow_right: AtomicU64,
    discarded_batches: AtomicU64,
}

/// Point-in-time copy of [`MixerStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MixerStatsSnapshot {
    pub frames: u64,
    pub sample_pairs: u64,
    pub gaps: u64,
    /// Frames emitted with one side filled with silence.
    pub silence_fills: u64,
    pub overflow_left: u64,
    pub overflow_right: u64,
    /// Batches the sinks ignored (non-mono or empty).
    pub discarded_batches: u64,
}

impl MixerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_frame(&self, pairs: usize, silence_filled: bool) {
        self.frames.fetch_add(1, Ordering::Relaxed);
        self.sample_pairs.fetch_add(pairs as u64, Ordering::Relaxed);
        if silence_filled {
            self.silence_fills.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_gap(&self) {
        self.gaps.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_overflow(&self, side: Side, dropped: usize) {
        let counter = match side {
            Side::Left => &self.overflow_left,
            Side::Right => &self.overflow_right,
        };
        counter.fetch_add(dropped as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_discarded_batch(&self) {
        self.discarded_batches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MixerStatsSnapshot {
        MixerStatsSnapshot {
            frames: self.frames.load(Ordering::Relaxed),
            sample_pairs: self.sample_pairs.load(Ordering::Relaxed),
            gaps: self.gaps.load(Ordering::Relaxed),
            silence_fills: self.silence_fills.load(Ordering::Relaxed),
            overflow_left: self.overflow_left.load(Ordering::Relaxed),
            overflow_right: self.overflow_right.load(Ordering::Relaxed),
            discarded_batches: self.discarded_batches.load(Ordering::Relaxed),
        }
    }
}
