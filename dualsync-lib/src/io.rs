//! Producer and consumer interfaces the synchronizer talks to.
//!
//! Capture and encoding live outside this crate. Producers implement
//! [`AudioSource`] and are created through a [`SourceFactory`]; they deliver
//! batches into an [`AudioSink`]. The finished stereo stream goes to a
//! [`StereoSink`].

use std::sync::Arc;

use crate::error::SyncError;
use crate::frame::{SampleFormat, StereoFrame};

/// Receiving end of a producer. Called on the producer's own thread.
pub trait AudioSink: Send + Sync {
    /// Deliver one batch of raw samples.
    fn receive_samples(
        &self,
        channels: u16,
        sample_rate: u32,
        format: SampleFormat,
        sample_count: usize,
        data: &[u8],
        timestamp: i64,
    );

    /// Report that samples were lost or capture was interrupted.
    fn receive_gap(&self);
}

/// Handle to a running producer. Dropping it destroys the producer.
pub trait AudioSource: Send {
    /// Attach the producer to `sink`, or detach it with `None`.
    ///
    /// After `connect(None)` returns the producer must not call the
    /// previously attached sink again.
    fn connect(&mut self, sink: Option<Arc<dyn AudioSink>>);
}

/// Resolves opaque source names into producers.
pub trait SourceFactory {
    fn open(
        &self,
        name: &str,
        sample_rate: u32,
        channels: u16,
    ) -> Result<Box<dyn AudioSource>, SyncError>;
}

/// Downstream consumer of the synchronized stream.
///
/// Called synchronously from the mixer thread, so implementations should not
/// block. An error stops the mixer.
pub trait StereoSink: Send + Sync {
    fn push_samples(&self, frame: StereoFrame) -> Result<(), SyncError>;

    fn push_gap(&self) -> Result<(), SyncError>;
}
