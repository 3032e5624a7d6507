//! Lifecycle of the dual-source synchronizer.
//!
//! Construction opens both producers, wires them to their channel sinks and
//! starts the mixer thread. Teardown runs in the opposite order: stop and join
//! the mixer, detach the sinks, then drop the producers.

use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::channel::{ChannelPair, ChannelSink, MixerWake, PairSnapshot, Side};
use crate::error::SyncError;
use crate::io::{AudioSink, AudioSource, SourceFactory, StereoSink};
use crate::mixer::{spawn_mixer_thread, MixerCore, MixerThreadArgs};
use crate::settings::SynchronizerSettings;
use crate::stats::{MixerStats, MixerStatsSnapshot};

/// Combines two mono producers into one stereo stream.
pub struct Synchronizer {
    settings: SynchronizerSettings,
    channels: ChannelPair,
    sink_left: Arc<ChannelSink>,
    sink_right: Arc<ChannelSink>,
    input_left: Option<Box<dyn AudioSource>>,
    input_right: Option<Box<dyn AudioSource>>,
    stats: Arc<MixerStats>,
    wake: Arc<MixerWake>,
    abort: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    mixer_thread_handle: Option<JoinHandle<()>>,
}

impl Synchronizer {
    /// Open both sources through `factory` and start mixing into `output`.
    ///
    /// On failure everything built so far is torn down before the error is
    /// returned.
    pub fn new(
        settings: SynchronizerSettings,
        factory: &dyn SourceFactory,
        output: Arc<dyn StereoSink>,
    ) -> Result<Self, SyncError> {
        settings.validate()?;
        info!(
            "starting dual-source synchronizer (left: {}, right: {}) ...",
            settings.left_source, settings.right_source
        );

        let channels = ChannelPair::new(settings.buffer_capacity());
        let stats = Arc::new(MixerStats::new());
        let wake = Arc::new(MixerWake::new(settings.wake_on_data));
        let sink_left = Arc::new(ChannelSink::new(
            channels.left.clone(),
            stats.clone(),
            wake.clone(),
        ));
        let sink_right = Arc::new(ChannelSink::new(
            channels.right.clone(),
            stats.clone(),
            wake.clone(),
        ));

        let mut synchronizer = Self {
            settings,
            channels,
            sink_left,
            sink_right,
            input_left: None,
            input_right: None,
            stats,
            wake,
            abort: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(false)),
            mixer_thread_handle: None,
        };

        // Dropping a half-built synchronizer runs the same teardown as a full one.
        if let Err(err) = synchronizer.start(factory, output) {
            warn!("dual-source synchronizer failed to start: {}", err);
            return Err(err);
        }

        info!("started dual-source synchronizer");
        Ok(synchronizer)
    }

    fn start(
        &mut self,
        factory: &dyn SourceFactory,
        output: Arc<dyn StereoSink>,
    ) -> Result<(), SyncError> {
        let sample_rate = self.settings.sample_rate;
        self.input_left = Some(factory.open(&self.settings.left_source, sample_rate, 1)?);
        self.input_right = Some(factory.open(&self.settings.right_source, sample_rate, 1)?);

        let sink_left: Arc<dyn AudioSink> = self.sink_left.clone();
        let sink_right: Arc<dyn AudioSink> = self.sink_right.clone();
        if let Some(input) = self.input_left.as_mut() {
            input.connect(Some(sink_left));
        }
        if let Some(input) = self.input_right.as_mut() {
            input.connect(Some(sink_right));
        }

        let core = MixerCore::new(
            self.channels.clone(),
            sample_rate,
            self.settings.silence_threshold(),
        );
        let handle = spawn_mixer_thread(MixerThreadArgs {
            core,
            output,
            stats: self.stats.clone(),
            wake: self.wake.clone(),
            abort: self.abort.clone(),
            running: self.running.clone(),
            poll_interval: self.settings.poll_interval(),
        })?;
        self.mixer_thread_handle = Some(handle);
        Ok(())
    }

    pub fn settings(&self) -> &SynchronizerSettings {
        &self.settings
    }

    /// Whether the mixer thread is still producing output.
    ///
    /// Turns false once the loop has stopped, including after an internal
    /// fault.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> MixerStatsSnapshot {
        self.stats.snapshot()
    }

    /// Counts and flags of both channel buffers.
    pub fn buffer_status(&self) -> Result<PairSnapshot, SyncError> {
        self.channels.snapshot()
    }

    /// The sink a producer for `side` writes into.
    ///
    /// Sources are wired up during construction; this is for hosts that also
    /// feed a channel directly.
    pub fn sink(&self, side: Side) -> Arc<ChannelSink> {
        match side {
            Side::Left => self.sink_left.clone(),
            Side::Right => self.sink_right.clone(),
        }
    }

    /// Stop the mixer and release both producers, returning the final counters.
    ///
    /// Every emission counted in the result has been handed to the output.
    pub fn stop(mut self) -> MixerStatsSnapshot {
        self.shutdown();
        self.stats.snapshot()
    }

    fn shutdown(&mut self) {
        if self.mixer_thread_handle.is_none()
            && self.input_left.is_none()
            && self.input_right.is_none()
        {
            return;
        }
        info!("stopping dual-source synchronizer ...");

        if let Some(handle) = self.mixer_thread_handle.take() {
            self.abort.store(true, Ordering::SeqCst);
            self.wake.notify_stop();
            if handle.join().is_err() {
                warn!("mixer thread panicked during join");
            }
        }

        // Detach before the producers go away.
        if let Some(input) = self.input_left.as_mut() {
            input.connect(None);
        }
        if let Some(input) = self.input_right.as_mut() {
            input.connect(None);
        }

        self.input_left = None;
        self.input_right = None;
        info!("stopped dual-source synchronizer");
    }
}

impl Drop for Synchronizer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
