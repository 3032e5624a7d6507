//! Mixer-thread orchestration.
//!
//! - `policy`: the per-iteration decision policy (gap, warm-up, steady state).
//! - `runner`: thread bootstrap and the polling loop.
//! - `guard`: liveness flag tied to the thread's lifetime.

mod guard;
mod policy;
mod runner;

pub use policy::{Emission, MixerCore};
pub use runner::{spawn_mixer_thread, MixerThreadArgs};
