//! # Dualsync
//!
//! Runs the dual-source synchronizer against synthetic or file-backed
//! producers and writes the stereo result to a WAV file.

use clap::Parser;
use log::error;
use std::path::PathBuf;

mod logging;
mod output;
mod runner;
mod sources;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Left source: tone:<hz>[:<drift_ppm>], wav:<path> or silence
    #[arg(short, long, value_name = "SOURCE")]
    left: Option<String>,

    /// Right source: tone:<hz>[:<drift_ppm>], wav:<path> or silence
    #[arg(short, long, value_name = "SOURCE")]
    right: Option<String>,

    /// Shared sample rate of both sources
    #[arg(long, value_name = "HZ")]
    sample_rate: Option<u32>,

    /// How long to run, in seconds
    #[arg(short, long, default_value_t = 2.0, value_name = "SECONDS")]
    duration: f64,

    /// JSON settings file; command line flags take precedence
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write the stereo stream to this WAV file
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Make synthetic producers report a gap at this period
    #[arg(long, value_name = "MS")]
    gap_every_ms: Option<u64>,

    /// Mixer poll interval
    #[arg(long, value_name = "MS")]
    poll_interval_ms: Option<u64>,

    /// One-sided buffering allowed before silence is filled in
    #[arg(long, value_name = "MS")]
    silence_threshold_ms: Option<u32>,

    /// Wake the mixer as soon as a source delivers
    #[arg(long)]
    wake_on_data: bool,
}

fn main() {
    let args = Cli::parse();
    let log_buffer = logging::init();

    let code = match runner::run(&args, log_buffer) {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err.to_string().to_lowercase());
            eprintln!("error: {}", err);
            -1
        }
    };

    std::process::exit(code)
}
