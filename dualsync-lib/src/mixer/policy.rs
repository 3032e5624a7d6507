//! One mixer iteration: snapshot both channels and decide what to emit.

use log::debug;

use crate::channel::{ChannelPair, Side};
use crate::error::SyncError;
use crate::frame::{hrt_time_micro, SampleFormat, StereoFrame};

/// What a single iteration hands downstream.
#[derive(Debug, Clone, PartialEq)]
pub enum Emission {
    Frame {
        frame: StereoFrame,
        /// One side was missing and has been filled with digital silence.
        silence_filled: bool,
    },
    Gap,
}

/// Decision policy of the mixer loop, independent of threading and timing.
pub struct MixerCore {
    channels: ChannelPair,
    sample_rate: u32,
    silence_threshold: usize,
    clock: fn() -> i64,
}

impl MixerCore {
    pub fn new(channels: ChannelPair, sample_rate: u32, silence_threshold: usize) -> Self {
        Self {
            channels,
            sample_rate,
            silence_threshold,
            clock: hrt_time_micro,
        }
    }

    /// Replace the timestamp source.
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn silence_threshold(&self) -> usize {
        self.silence_threshold
    }

    /// Run one iteration against the current buffer contents.
    pub fn step(&mut self) -> Result<Option<Emission>, SyncError> {
        let snapshot = self.channels.snapshot()?;
        let (left, right) = (snapshot.left, snapshot.right);

        // A hole on either side restarts both channels from empty.
        if left.hole || right.hole {
            let mut guard = self.channels.lock()?;
            guard.left.reset();
            guard.right.reset();
            drop(guard);
            debug!(
                "propagating gap, discarded {} left and {} right samples",
                left.count, right.count
            );
            return Ok(Some(Emission::Gap));
        }

        if !left.started || !right.started {
            if left.started && left.count > self.silence_threshold {
                return self.drain_one_sided(Side::Left);
            } else if right.started && right.count > self.silence_threshold {
                return self.drain_one_sided(Side::Right);
            }
            return Ok(None);
        }

        if left.count.min(right.count) == 0 {
            if left.count > self.silence_threshold {
                return self.drain_one_sided(Side::Left);
            } else if right.count > self.silence_threshold {
                return self.drain_one_sided(Side::Right);
            }
            return Ok(None);
        }

        self.interleave()
    }

    /// Emit every buffered sample of `side` with silence on the other side.
    fn drain_one_sided(&mut self, side: Side) -> Result<Option<Emission>, SyncError> {
        let mut guard = self.channels.lock()?;
        let samples = guard.side(side).drain_all();
        drop(guard);
        if samples.is_empty() {
            return Ok(None);
        }

        let mut output = vec![0_i16; samples.len() * 2];
        let offset = match side {
            Side::Left => 0,
            Side::Right => 1,
        };
        for (i, sample) in samples.iter().enumerate() {
            output[i * 2 + offset] = *sample;
        }
        debug!(
            "{} channel over threshold, emitting {} samples with silence",
            side.name(),
            samples.len()
        );
        Ok(Some(Emission::Frame {
            frame: self.frame(output),
            silence_filled: true,
        }))
    }

    /// Pair up the common prefix of both buffers.
    fn interleave(&mut self) -> Result<Option<Emission>, SyncError> {
        let mut guard = self.channels.lock()?;
        // Producers may have appended since the snapshot.
        let min_samples = guard.left.len().min(guard.right.len());
        if min_samples == 0 {
            return Ok(None);
        }

        let mut output = Vec::with_capacity(min_samples * 2);
        for _ in 0..min_samples {
            match (guard.left.pop_front(), guard.right.pop_front()) {
                (Some(left), Some(right)) => {
                    output.push(left);
                    output.push(right);
                }
                _ => break,
            }
        }
        drop(guard);

        Ok(Some(Emission::Frame {
            frame: self.frame(output),
            silence_filled: false,
        }))
    }

    fn frame(&self, samples: Vec<i16>) -> StereoFrame {
        StereoFrame {
            sample_rate: self.sample_rate,
            format: SampleFormat::S16,
            samples,
            timestamp: (self.clock)(),
        }
    }
}
