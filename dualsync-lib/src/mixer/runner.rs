//! Mixer thread bootstrap and long-running loop.

use log::{debug, error, info};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
#[cfg(feature = "debug")]
use std::time::Instant;

use crate::channel::MixerWake;
use crate::error::SyncError;
use crate::io::StereoSink;
use crate::stats::MixerStats;

use super::policy::{Emission, MixerCore};
use super::guard::MixerThreadGuard;

/// Arguments required to spawn the mixer thread.
pub struct MixerThreadArgs {
    pub core: MixerCore,
    pub output: Arc<dyn StereoSink>,
    pub stats: Arc<MixerStats>,
    pub wake: Arc<MixerWake>,
    pub abort: Arc<AtomicBool>,
    pub running: Arc<AtomicBool>,
    pub poll_interval: Duration,
}

/// Spawn the mixer thread.
pub fn spawn_mixer_thread(args: MixerThreadArgs) -> Result<JoinHandle<()>, SyncError> {
    args.running.store(true, Ordering::SeqCst);
    let running = args.running.clone();
    thread::Builder::new()
        .name("dualsync-mixer".to_string())
        .spawn(move || run_mixer_thread(args))
        .map_err(|err| {
            running.store(false, Ordering::SeqCst);
            SyncError::Thread(err)
        })
}

fn run_mixer_thread(args: MixerThreadArgs) {
    let MixerThreadArgs {
        mut core,
        output,
        stats,
        wake,
        abort,
        running,
        poll_interval,
    } = args;
    let _guard = MixerThreadGuard::new(running);

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        mix_loop(&mut core, output.as_ref(), &stats, &wake, &abort, poll_interval)
    }));

    // Any failure ends the loop; the owner only notices through `is_running`.
    match result {
        Ok(Ok(())) => info!("mixer thread stopped"),
        Ok(Err(err)) => error!("error '{}' in mixer thread", err),
        Err(payload) => match panic_message(payload.as_ref()) {
            Some(message) => error!("panic '{}' in mixer thread", message),
            None => error!("unknown panic in mixer thread"),
        },
    }
}

fn mix_loop(
    core: &mut MixerCore,
    output: &dyn StereoSink,
    stats: &MixerStats,
    wake: &MixerWake,
    abort: &AtomicBool,
    poll_interval: Duration,
) -> Result<(), SyncError> {
    info!(
        "mixer thread started (silence threshold: {} samples)",
        core.silence_threshold()
    );
    #[cfg(feature = "debug")]
    let mut last_stats_log = Instant::now();

    while !abort.load(Ordering::SeqCst) {
        wake.wait(poll_interval);

        match core.step()? {
            None => {}
            Some(Emission::Gap) => {
                stats.record_gap();
                output.push_gap()?;
            }
            Some(Emission::Frame {
                frame,
                silence_filled,
            }) => {
                stats.record_frame(frame.sample_count(), silence_filled);
                output.push_samples(frame)?;
            }
        }

        #[cfg(feature = "debug")]
        if last_stats_log.elapsed() >= Duration::from_secs(1) {
            debug!("mixer stats: {:?}", stats.snapshot());
            last_stats_log = Instant::now();
        }
    }

    debug!("mixer stop requested");
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> Option<&str> {
    if let Some(message) = payload.downcast_ref::<&str>() {
        Some(*message)
    } else {
        payload.downcast_ref::<String>().map(|message| message.as_str())
    }
}
