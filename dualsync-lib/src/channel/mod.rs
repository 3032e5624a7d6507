//! Per-channel sample staging.
//!
//! Each side of the synchronizer owns one [`ChannelBuffer`]: a bounded FIFO of
//! decoded mono samples plus the `started` and `hole` flags. A batch that does
//! not fit is refused and latches the hole, so both sides are resynchronised
//! together instead of one side losing samples. Producers write
//! through a [`ChannelSink`]; the mixer reads through [`ChannelPair`], which
//! always locks left before right.

use dasp_ring_buffer::Bounded;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::SyncError;

mod sink;
mod wake;

pub use sink::ChannelSink;
pub use wake::MixerWake;

/// Which side of the stereo output a channel feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Lock-protected contents of one channel buffer.
#[derive(Debug)]
pub struct ChannelState {
    samples: Bounded<Vec<i16>>,
    capacity: usize,
    started: bool,
    hole: bool,
}

impl ChannelState {
    fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Bounded::from(vec![0; capacity]),
            capacity,
            started: false,
            hole: false,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.len() == 0
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn has_hole(&self) -> bool {
        self.hole
    }

    /// Append samples at the tail and mark the channel started.
    ///
    /// A batch that would overrun the ring is refused whole and marks a hole.
    /// Returns the number of refused samples.
    pub(crate) fn append(&mut self, samples: &[i16]) -> usize {
        self.started = true;
        if self.samples.len() + samples.len() > self.capacity {
            self.hole = true;
            return samples.len();
        }
        for &sample in samples {
            self.samples.push(sample);
        }
        0
    }

    pub(crate) fn mark_hole(&mut self) {
        self.hole = true;
    }

    pub(crate) fn pop_front(&mut self) -> Option<i16> {
        self.samples.pop()
    }

    /// Remove and return every buffered sample in FIFO order.
    pub(crate) fn drain_all(&mut self) -> Vec<i16> {
        let mut out = Vec::with_capacity(self.samples.len());
        while let Some(sample) = self.samples.pop() {
            out.push(sample);
        }
        out
    }

    /// Discard all samples and clear both flags.
    pub(crate) fn reset(&mut self) {
        while self.samples.pop().is_some() {}
        self.started = false;
        self.hole = false;
    }

    fn snapshot(&self) -> ChannelSnapshot {
        ChannelSnapshot {
            count: self.len(),
            started: self.started,
            hole: self.hole,
        }
    }
}

/// One channel's shared sample buffer.
#[derive(Debug)]
pub struct ChannelBuffer {
    side: Side,
    state: Mutex<ChannelState>,
}

impl ChannelBuffer {
    pub fn new(side: Side, capacity: usize) -> Self {
        Self {
            side,
            state: Mutex::new(ChannelState::with_capacity(capacity)),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, ChannelState>, SyncError> {
        self.state.lock().map_err(|_| match self.side {
            Side::Left => SyncError::Poisoned("left channel buffer"),
            Side::Right => SyncError::Poisoned("right channel buffer"),
        })
    }
}

/// Counts and flags of one channel captured under lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChannelSnapshot {
    pub count: usize,
    pub started: bool,
    pub hole: bool,
}

/// Both channels captured together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PairSnapshot {
    pub left: ChannelSnapshot,
    pub right: ChannelSnapshot,
}

/// Guards for both channel buffers, acquired left then right.
pub struct PairGuard<'a> {
    pub left: MutexGuard<'a, ChannelState>,
    pub right: MutexGuard<'a, ChannelState>,
}

impl PairGuard<'_> {
    pub fn side(&mut self, side: Side) -> &mut ChannelState {
        match side {
            Side::Left => &mut *self.left,
            Side::Right => &mut *self.right,
        }
    }
}

/// The left and right buffers, only ever locked together.
#[derive(Debug, Clone)]
pub struct ChannelPair {
    pub left: Arc<ChannelBuffer>,
    pub right: Arc<ChannelBuffer>,
}

impl ChannelPair {
    pub fn new(capacity: usize) -> Self {
        Self {
            left: Arc::new(ChannelBuffer::new(Side::Left, capacity)),
            right: Arc::new(ChannelBuffer::new(Side::Right, capacity)),
        }
    }

    /// Lock both buffers. Left is always acquired first.
    pub fn lock(&self) -> Result<PairGuard<'_>, SyncError> {
        let left = self.left.lock()?;
        let right = self.right.lock()?;
        Ok(PairGuard { left, right })
    }

    pub fn snapshot(&self) -> Result<PairSnapshot, SyncError> {
        let guard = self.lock()?;
        Ok(PairSnapshot {
            left: guard.left.snapshot(),
            right: guard.right.snapshot(),
        })
    }
}
