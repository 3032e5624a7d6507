//! Stereo consumer writing the synchronized stream to a WAV file.

use dualsync_lib::{StereoFrame, StereoSink, SyncError};
use log::debug;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Mutex;

type Writer = hound::WavWriter<BufWriter<File>>;

/// What the consumer saw during a run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct OutputSummary {
    pub frames: u64,
    pub sample_pairs: u64,
    pub gaps: u64,
    /// Timestamp of the last frame in microseconds, `-1` if none arrived.
    pub last_timestamp: i64,
}

/// Counts everything it receives and optionally writes it as 16-bit stereo WAV.
///
/// Gaps are counted only; the file stays contiguous.
pub struct WavOutput {
    writer: Mutex<Option<Writer>>,
    frames: AtomicU64,
    sample_pairs: AtomicU64,
    gaps: AtomicU64,
    last_timestamp: AtomicI64,
}

impl WavOutput {
    pub fn create(path: Option<&Path>, sample_rate: u32) -> Result<Self, hound::Error> {
        let writer = match path {
            Some(path) => {
                let spec = hound::WavSpec {
                    channels: StereoFrame::CHANNELS,
                    sample_rate,
                    bits_per_sample: 16,
                    sample_format: hound::SampleFormat::Int,
                };
                Some(hound::WavWriter::create(path, spec)?)
            }
            None => None,
        };
        Ok(Self {
            writer: Mutex::new(writer),
            frames: AtomicU64::new(0),
            sample_pairs: AtomicU64::new(0),
            gaps: AtomicU64::new(0),
            last_timestamp: AtomicI64::new(-1),
        })
    }

    /// Flush and close the file. Later frames are only counted.
    pub fn finalize(&self) -> Result<(), hound::Error> {
        let writer = self
            .writer
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take();
        match writer {
            Some(writer) => writer.finalize(),
            None => Ok(()),
        }
    }

    pub fn summary(&self) -> OutputSummary {
        OutputSummary {
            frames: self.frames.load(Ordering::Relaxed),
            sample_pairs: self.sample_pairs.load(Ordering::Relaxed),
            gaps: self.gaps.load(Ordering::Relaxed),
            last_timestamp: self.last_timestamp.load(Ordering::Relaxed),
        }
    }
}

impl StereoSink for WavOutput {
    fn push_samples(&self, frame: StereoFrame) -> Result<(), SyncError> {
        self.frames.fetch_add(1, Ordering::Relaxed);
        self.sample_pairs
            .fetch_add(frame.sample_count() as u64, Ordering::Relaxed);
        self.last_timestamp.store(frame.timestamp, Ordering::Relaxed);

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| SyncError::Output("wav writer lock poisoned".to_string()))?;
        if let Some(writer) = writer.as_mut() {
            for sample in &frame.samples {
                writer
                    .write_sample(*sample)
                    .map_err(|err| SyncError::Output(err.to_string()))?;
            }
        }
        Ok(())
    }

    fn push_gap(&self) -> Result<(), SyncError> {
        self.gaps.fetch_add(1, Ordering::Relaxed);
        debug!("gap received from synchronizer");
        Ok(())
    }
}
