//! Sample formats, stereo frames and the monotonic capture clock.

use std::sync::OnceLock;
use std::time::Instant;

/// Raw sample encodings a producer may tag its batches with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// 16-bit signed little-endian.
    S16,
    /// 32-bit float, native endian. Never produced by the synchronizer.
    F32,
}

/// One emitted unit of interleaved stereo output.
#[derive(Debug, Clone, PartialEq)]
pub struct StereoFrame {
    pub sample_rate: u32,
    pub format: SampleFormat,
    /// Interleaved `(left, right)` pairs.
    pub samples: Vec<i16>,
    /// Capture time of emission in microseconds, see [`hrt_time_micro`].
    pub timestamp: i64,
}

impl StereoFrame {
    pub const CHANNELS: u16 = 2;

    pub fn channels(&self) -> u16 {
        Self::CHANNELS
    }

    /// Number of sample pairs in the frame.
    pub fn sample_count(&self) -> usize {
        self.samples.len() / 2
    }

    /// Left channel samples, de-interleaved.
    pub fn left(&self) -> Vec<i16> {
        self.samples.iter().step_by(2).copied().collect()
    }

    /// Right channel samples, de-interleaved.
    pub fn right(&self) -> Vec<i16> {
        self.samples.iter().skip(1).step_by(2).copied().collect()
    }
}

/// Encode samples as S16LE bytes, the layout producers hand to a sink.
pub fn encode_s16le(samples: &[i16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

/// Decode at most `sample_count` S16LE samples from `data`.
///
/// A trailing odd byte, or a buffer shorter than `sample_count` samples, is
/// never read past; only complete samples are yielded.
pub fn decode_s16le(data: &[u8], sample_count: usize) -> impl Iterator<Item = i16> + '_ {
    data.chunks_exact(2)
        .take(sample_count)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
}

static CLOCK_ORIGIN: OnceLock<Instant> = OnceLock::new();

/// Monotonic microsecond clock shared by every frame in the process.
pub fn hrt_time_micro() -> i64 {
    let origin = CLOCK_ORIGIN.get_or_init(Instant::now);
    origin.elapsed().as_micros() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_stops_at_sample_count() {
        let bytes = encode_s16le(&[1, -2, 3, -4]);
        let decoded: Vec<i16> = decode_s16le(&bytes, 2).collect();
        assert_eq!(decoded, vec![1, -2]);
    }

    #[test]
    fn decode_ignores_incomplete_trailing_sample() {
        let mut bytes = encode_s16le(&[i16::MAX, i16::MIN]);
        bytes.push(0x7f);
        let decoded: Vec<i16> = decode_s16le(&bytes, 10).collect();
        assert_eq!(decoded, vec![i16::MAX, i16::MIN]);
    }

    #[test]
    fn frame_splits_channels() {
        let frame = StereoFrame {
            sample_rate: 48_000,
            format: SampleFormat::S16,
            samples: vec![1, 10, 2, 20, 3, 30],
            timestamp: 0,
        };
        assert_eq!(frame.channels(), 2);
        assert_eq!(frame.sample_count(), 3);
        assert_eq!(frame.left(), vec![1, 2, 3]);
        assert_eq!(frame.right(), vec![10, 20, 30]);
    }

    #[test]
    fn clock_is_monotonic() {
        let first = hrt_time_micro();
        let second = hrt_time_micro();
        assert!(second >= first);
    }
}
