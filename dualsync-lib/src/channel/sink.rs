//! Producer-facing endpoint writing into one channel buffer.

use log::{error, warn};
use std::sync::Arc;

use crate::frame::{decode_s16le, SampleFormat};
use crate::io::AudioSink;
use crate::stats::MixerStats;

use super::{ChannelBuffer, MixerWake};

/// Accepts mono S16LE batches and gap reports for one side.
pub struct ChannelSink {
    buffer: Arc<ChannelBuffer>,
    stats: Arc<MixerStats>,
    wake: Arc<MixerWake>,
}

impl ChannelSink {
    pub fn new(buffer: Arc<ChannelBuffer>, stats: Arc<MixerStats>, wake: Arc<MixerWake>) -> Self {
        Self {
            buffer,
            stats,
            wake,
        }
    }
}

impl AudioSink for ChannelSink {
    fn receive_samples(
        &self,
        channels: u16,
        _sample_rate: u32,
        _format: SampleFormat,
        sample_count: usize,
        data: &[u8],
        _timestamp: i64,
    ) {
        // Only mono input is accepted.
        if channels != 1 || sample_count == 0 {
            self.stats.record_discarded_batch();
            return;
        }

        let side = self.buffer.side();
        let samples: Vec<i16> = decode_s16le(data, sample_count).collect();
        let mut state = match self.buffer.lock() {
            Ok(state) => state,
            Err(err) => {
                error!("dropping {} samples: {}", side.name(), err);
                return;
            }
        };
        let was_empty = state.is_empty();
        let refused = state.append(&samples);
        drop(state);

        if refused > 0 {
            self.stats.record_overflow(side, refused);
            warn!(
                "{} channel buffer full, refused {} samples and marked a gap",
                side.name(),
                refused
            );
        }
        if was_empty || refused > 0 {
            self.wake.notify_data();
        }
    }

    fn receive_gap(&self) {
        match self.buffer.lock() {
            Ok(mut state) => state.mark_hole(),
            Err(err) => {
                error!("dropping {} gap: {}", self.buffer.side().name(), err);
                return;
            }
        }
        self.wake.notify_data();
    }
}
