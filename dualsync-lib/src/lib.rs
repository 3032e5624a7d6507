//! # Dualsync Library
//!
//! Synchronizes two independently produced mono capture streams into one
//! time-aligned stereo stream. Each producer pushes into its own channel
//! buffer; a mixer thread pairs the buffered samples positionally, fills a
//! lagging side with silence after a bounded wait, and turns a discontinuity on
//! either side into a gap for the downstream consumer.

pub mod channel;
pub mod error;
pub mod frame;
pub mod io;
pub mod mixer;
pub mod settings;
pub mod stats;
pub mod synchronizer;

#[cfg(test)]
mod test_support;

pub use error::SyncError;
pub use frame::{SampleFormat, StereoFrame};
pub use io::{AudioSink, AudioSource, SourceFactory, StereoSink};
pub use settings::SynchronizerSettings;
pub use synchronizer::Synchronizer;
