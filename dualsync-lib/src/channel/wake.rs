//! Wake-up signal between the channel sinks and the mixer thread.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Interruptible wait used for the mixer period.
///
/// With data wake-ups disabled only a stop request cuts a wait short, so the
/// mixer polls at its fixed interval.
#[derive(Debug)]
pub struct MixerWake {
    pending: Mutex<bool>,
    condvar: Condvar,
    wake_on_data: bool,
}

impl MixerWake {
    pub fn new(wake_on_data: bool) -> Self {
        Self {
            pending: Mutex::new(false),
            condvar: Condvar::new(),
            wake_on_data,
        }
    }

    /// Signal that a buffer became non-empty or raised a hole.
    pub fn notify_data(&self) {
        if self.wake_on_data {
            self.signal();
        }
    }

    /// Cut the current wait short so the mixer sees its stop flag.
    pub fn notify_stop(&self) {
        self.signal();
    }

    /// Block for at most `timeout`, returning early when signalled.
    pub fn wait(&self, timeout: Duration) {
        let pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        let mut pending = match self
            .condvar
            .wait_timeout_while(pending, timeout, |pending| !*pending)
        {
            Ok((guard, _)) => guard,
            Err(poisoned) => poisoned.into_inner().0,
        };
        *pending = false;
    }

    fn signal(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        *pending = true;
        self.condvar.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn wait_times_out_without_signal() {
        let wake = MixerWake::new(false);
        let start = Instant::now();
        wake.wait(Duration::from_millis(10));
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn data_signal_ignored_when_polling() {
        let wake = MixerWake::new(false);
        wake.notify_data();
        let start = Instant::now();
        wake.wait(Duration::from_millis(10));
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn pending_data_signal_returns_immediately() {
        let wake = MixerWake::new(true);
        wake.notify_data();
        let start = Instant::now();
        wake.wait(Duration::from_secs(5));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn stop_signal_interrupts_wait() {
        let wake = Arc::new(MixerWake::new(false));
        let waiter = {
            let wake = wake.clone();
            thread::spawn(move || {
                let start = Instant::now();
                wake.wait(Duration::from_secs(10));
                start.elapsed()
            })
        };
        thread::sleep(Duration::from_millis(20));
        wake.notify_stop();
        let waited = waiter.join().unwrap();
        assert!(waited < Duration::from_secs(10));
    }
}
