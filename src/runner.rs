use dualsync_lib::stats::MixerStatsSnapshot;
use dualsync_lib::{SyncError, Synchronizer, SynchronizerSettings};
use log::info;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

use crate::logging::{self, LogBuffer};
use crate::output::{OutputSummary, WavOutput};
use crate::sources::CliSourceFactory;
use crate::Cli;

const DEFAULT_LEFT_SOURCE: &str = "tone:440";
const DEFAULT_RIGHT_SOURCE: &str = "tone:660";

#[derive(Debug)]
pub enum CliError {
    Sync(SyncError),
    Wav(hound::Error),
    Json(serde_json::Error),
    Args(String),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sync(err) => write!(f, "{}", err),
            Self::Wav(err) => write!(f, "wav error: {}", err),
            Self::Json(err) => write!(f, "report error: {}", err),
            Self::Args(err) => write!(f, "invalid arguments: {}", err),
        }
    }
}

impl std::error::Error for CliError {}

impl From<SyncError> for CliError {
    fn from(value: SyncError) -> Self {
        Self::Sync(value)
    }
}

impl From<hound::Error> for CliError {
    fn from(value: hound::Error) -> Self {
        Self::Wav(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Printed to stdout once the run finishes.
#[derive(Debug, Serialize)]
struct RunReport {
    settings: SynchronizerSettings,
    stats: MixerStatsSnapshot,
    output: OutputSummary,
    mixer_running: bool,
    log: Vec<String>,
}

fn build_settings(args: &Cli) -> Result<SynchronizerSettings, CliError> {
    let mut settings = match &args.config {
        Some(path) => SynchronizerSettings::from_json_file(path)?,
        None => SynchronizerSettings::new(DEFAULT_LEFT_SOURCE, DEFAULT_RIGHT_SOURCE, 48_000),
    };
    if let Some(left) = &args.left {
        settings.left_source = left.clone();
    }
    if let Some(right) = &args.right {
        settings.right_source = right.clone();
    }
    if let Some(sample_rate) = args.sample_rate {
        settings.sample_rate = sample_rate;
    }
    if let Some(ms) = args.poll_interval_ms {
        settings.set_poll_interval_ms(ms);
    }
    if let Some(ms) = args.silence_threshold_ms {
        settings.set_silence_threshold_ms(ms);
    }
    if args.wake_on_data {
        settings.set_wake_on_data(true);
    }
    settings.validate()?;
    Ok(settings)
}

pub fn run(args: &Cli, log_buffer: LogBuffer) -> Result<i32, CliError> {
    if !(args.duration.is_finite() && args.duration > 0.0) {
        return Err(CliError::Args("duration must be a positive number of seconds".to_string()));
    }
    let settings = build_settings(args)?;
    info!(
        "running for {:.2}s at {} Hz",
        args.duration, settings.sample_rate
    );

    let output = Arc::new(WavOutput::create(
        args.output.as_deref(),
        settings.sample_rate,
    )?);
    let factory = CliSourceFactory::new(args.gap_every_ms.map(Duration::from_millis));
    let synchronizer = Synchronizer::new(settings, &factory, output.clone())?;

    sleep(Duration::from_secs_f64(args.duration));

    let mixer_running = synchronizer.is_running();
    let settings = synchronizer.settings().clone();
    let stats = synchronizer.stop();
    output.finalize()?;

    let report = RunReport {
        settings,
        stats,
        output: output.summary(),
        mixer_running,
        log: logging::snapshot(&log_buffer),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(if mixer_running { 0 } else { 1 })
}
