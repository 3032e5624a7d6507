//! Synchronizer configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::SyncError;

pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5;
pub const DEFAULT_SILENCE_THRESHOLD_MS: u32 = 100;
pub const DEFAULT_BUFFER_CAPACITY_MS: u32 = 10_000;

/// Upper bounds checked by [`SynchronizerSettings::validate`]. Both rings are
/// allocated up front, so these cap the memory a settings file can request.
pub const MAX_SAMPLE_RATE: u32 = 384_000;
pub const MAX_BUFFER_CAPACITY_MS: u32 = 60_000;

/// Settings shared by both channels and the mixer loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynchronizerSettings {
    pub left_source: String,
    pub right_source: String,
    pub sample_rate: u32,
    pub poll_interval_ms: u64,
    /// One-sided buffering allowed before the missing side is filled with silence.
    pub silence_threshold_ms: u32,
    /// Per-channel ring capacity. A batch that does not fit is refused and
    /// reported as a gap on that channel.
    pub buffer_capacity_ms: u32,
    /// Wake the mixer as soon as a buffer receives data instead of waiting
    /// out the full poll interval.
    pub wake_on_data: bool,
}

impl Default for SynchronizerSettings {
    fn default() -> Self {
        Self {
            left_source: "left".to_string(),
            right_source: "right".to_string(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            silence_threshold_ms: DEFAULT_SILENCE_THRESHOLD_MS,
            buffer_capacity_ms: DEFAULT_BUFFER_CAPACITY_MS,
            wake_on_data: false,
        }
    }
}

impl SynchronizerSettings {
    pub fn new(left_source: &str, right_source: &str, sample_rate: u32) -> Self {
        Self {
            left_source: left_source.to_string(),
            right_source: right_source.to_string(),
            sample_rate,
            ..Self::default()
        }
    }

    /// Parse settings from a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, SyncError> {
        let settings: Self = serde_json::from_str(json)?;
        Ok(settings)
    }

    /// Read and parse a JSON settings file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SyncError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Reject settings the mixer loop cannot run with.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.sample_rate == 0 {
            return Err(SyncError::Config("sample_rate must be positive".to_string()));
        }
        if self.poll_interval_ms == 0 {
            return Err(SyncError::Config(
                "poll_interval_ms must be positive".to_string(),
            ));
        }
        if self.sample_rate > MAX_SAMPLE_RATE {
            return Err(SyncError::Config(format!(
                "sample_rate {} exceeds {}",
                self.sample_rate, MAX_SAMPLE_RATE
            )));
        }
        if self.buffer_capacity_ms > MAX_BUFFER_CAPACITY_MS {
            return Err(SyncError::Config(format!(
                "buffer_capacity_ms {} exceeds {}",
                self.buffer_capacity_ms, MAX_BUFFER_CAPACITY_MS
            )));
        }
        if self.silence_threshold_ms >= MAX_BUFFER_CAPACITY_MS {
            return Err(SyncError::Config(format!(
                "silence_threshold_ms must be below {}",
                MAX_BUFFER_CAPACITY_MS
            )));
        }
        Ok(())
    }

    /// Silence threshold in samples per channel.
    ///
    /// With the default 100 ms this is exactly `sample_rate / 10`.
    pub fn silence_threshold(&self) -> usize {
        (self.sample_rate as u64 * self.silence_threshold_ms as u64 / 1000) as usize
    }

    /// Ring capacity in samples per channel, never below the silence threshold.
    pub fn buffer_capacity(&self) -> usize {
        let capacity =
            (self.sample_rate as u64 * self.buffer_capacity_ms as u64 / 1000) as usize;
        capacity.max(self.silence_threshold() + 1)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Configure the mixer period (ms). Clamped to at least 1 ms.
    pub fn set_poll_interval_ms(&mut self, ms: u64) {
        self.poll_interval_ms = ms.max(1);
    }

    /// Configure the one-sided latency bound (ms).
    pub fn set_silence_threshold_ms(&mut self, ms: u32) {
        self.silence_threshold_ms = ms;
    }

    /// Configure the per-channel ring capacity (ms).
    pub fn set_buffer_capacity_ms(&mut self, ms: u32) {
        self.buffer_capacity_ms = ms;
    }

    pub fn set_wake_on_data(&mut self, enabled: bool) {
        self.wake_on_data = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_threshold_is_a_tenth_of_the_rate() {
        for rate in [8_000, 11_025, 22_050, 44_100, 48_000, 96_000] {
            let settings = SynchronizerSettings::new("a", "b", rate);
            assert_eq!(settings.silence_threshold(), (rate / 10) as usize);
        }
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let json = r#"{"left_source":"mic","sample_rate":44100,"wake_on_data":true}"#;
        let settings = SynchronizerSettings::from_json_str(json).expect("parse settings");
        assert_eq!(settings.left_source, "mic");
        assert_eq!(settings.right_source, "right");
        assert_eq!(settings.sample_rate, 44_100);
        assert_eq!(settings.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        assert!(settings.wake_on_data);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = SynchronizerSettings::from_json_str("{\"sample_rate\": \"fast\"}")
            .expect_err("reject bad type");
        assert!(matches!(err, SyncError::Config(_)));
    }

    #[test]
    fn zero_rate_fails_validation() {
        let settings = SynchronizerSettings::new("a", "b", 0);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn oversized_buffers_fail_validation() {
        let settings = SynchronizerSettings::from_json_str(
            r#"{"sample_rate":48000,"buffer_capacity_ms":4294967295}"#,
        )
        .expect("parse settings");
        assert!(matches!(settings.validate(), Err(SyncError::Config(_))));

        let mut settings = SynchronizerSettings::default();
        settings.set_silence_threshold_ms(u32::MAX);
        assert!(matches!(settings.validate(), Err(SyncError::Config(_))));

        let settings = SynchronizerSettings::new("a", "b", u32::MAX);
        assert!(matches!(settings.validate(), Err(SyncError::Config(_))));
    }

    #[test]
    fn largest_allowed_buffers_pass_validation() {
        let mut settings = SynchronizerSettings::new("a", "b", MAX_SAMPLE_RATE);
        settings.set_buffer_capacity_ms(MAX_BUFFER_CAPACITY_MS);
        settings.set_silence_threshold_ms(MAX_BUFFER_CAPACITY_MS - 1);
        assert!(settings.validate().is_ok());
        assert_eq!(
            settings.buffer_capacity(),
            MAX_SAMPLE_RATE as usize * (MAX_BUFFER_CAPACITY_MS / 1000) as usize
        );
    }

    #[test]
    fn capacity_never_below_threshold() {
        let mut settings = SynchronizerSettings::new("a", "b", 48_000);
        settings.set_buffer_capacity_ms(1);
        assert_eq!(settings.buffer_capacity(), settings.silence_threshold() + 1);
    }

    #[test]
    fn poll_interval_setter_clamps_to_one_ms() {
        let mut settings = SynchronizerSettings::default();
        settings.set_poll_interval_ms(0);
        assert_eq!(settings.poll_interval(), Duration::from_millis(1));
    }
}
