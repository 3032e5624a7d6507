//! Stand-in producers for exercising the synchronizer without capture devices.
//!
//! Source names:
//! - `tone:<hz>[:<drift_ppm>]` sine wave delivered in jittered batches
//! - `wav:<path>` mono 16-bit WAV file streamed in real time
//! - `silence` a producer that never delivers

use dualsync_lib::frame::{encode_s16le, hrt_time_micro};
use dualsync_lib::{AudioSink, AudioSource, SampleFormat, SourceFactory, SyncError};
use log::{debug, warn};
use rand::Rng;
use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const TONE_AMPLITUDE: f64 = 0.3 * i16::MAX as f64;
const MIN_BATCH_MS: u64 = 5;
const MAX_BATCH_MS: u64 = 15;

/// Produces the next `count` samples, or `None` once exhausted.
trait SampleGenerator: Send {
    fn next_batch(&mut self, count: usize) -> Option<Vec<i16>>;
}

struct ToneGenerator {
    phase: f64,
    step: f64,
}

impl ToneGenerator {
    fn new(frequency: f64, sample_rate: u32) -> Self {
        Self {
            phase: 0.0,
            step: 2.0 * PI * frequency / sample_rate as f64,
        }
    }
}

impl SampleGenerator for ToneGenerator {
    fn next_batch(&mut self, count: usize) -> Option<Vec<i16>> {
        let mut batch = Vec::with_capacity(count);
        for _ in 0..count {
            batch.push((self.phase.sin() * TONE_AMPLITUDE) as i16);
            self.phase = (self.phase + self.step) % (2.0 * PI);
        }
        Some(batch)
    }
}

struct WavGenerator {
    samples: Vec<i16>,
    position: usize,
}

impl SampleGenerator for WavGenerator {
    fn next_batch(&mut self, count: usize) -> Option<Vec<i16>> {
        if self.position >= self.samples.len() {
            return None;
        }
        let end = (self.position + count).min(self.samples.len());
        let batch = self.samples[self.position..end].to_vec();
        self.position = end;
        Some(batch)
    }
}

struct SilentGenerator;

impl SampleGenerator for SilentGenerator {
    fn next_batch(&mut self, _count: usize) -> Option<Vec<i16>> {
        Some(Vec::new())
    }
}

fn boxed(generator: impl SampleGenerator + 'static) -> Box<dyn SampleGenerator> {
    Box::new(generator)
}

type SinkSlot = Arc<Mutex<Option<Arc<dyn AudioSink>>>>;

/// Producer running on its own thread. Dropping it stops and joins the thread.
struct ProducerHandle {
    name: String,
    target: SinkSlot,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl AudioSource for ProducerHandle {
    fn connect(&mut self, sink: Option<Arc<dyn AudioSink>>) {
        // Batches are delivered under this lock, so nothing reaches the old
        // sink once this returns.
        let mut target = self.target.lock().unwrap_or_else(|p| p.into_inner());
        *target = sink;
    }
}

impl Drop for ProducerHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("producer '{}' panicked during join", self.name);
            }
        }
    }
}

struct ProducerArgs {
    generator: Box<dyn SampleGenerator>,
    sample_rate: u32,
    drift_ppm: f64,
    gap_every: Option<Duration>,
    target: SinkSlot,
    stop: Arc<AtomicBool>,
}

fn run_producer(args: ProducerArgs) {
    let ProducerArgs {
        mut generator,
        sample_rate,
        drift_ppm,
        gap_every,
        target,
        stop,
    } = args;
    let mut rng = rand::thread_rng();
    let rate = sample_rate as f64 * (1.0 + drift_ppm / 1_000_000.0);
    let mut owed = 0.0_f64;
    let mut last = Instant::now();
    let mut last_gap = Instant::now();

    while !stop.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(
            rng.gen_range(MIN_BATCH_MS..=MAX_BATCH_MS),
        ));
        let now = Instant::now();
        owed += now.duration_since(last).as_secs_f64() * rate;
        last = now;
        let count = owed.floor() as usize;
        owed -= count as f64;

        let Some(batch) = generator.next_batch(count) else {
            debug!("producer exhausted");
            break;
        };

        let Ok(target) = target.lock() else {
            break;
        };
        let Some(sink) = target.as_ref() else {
            continue;
        };
        if let Some(period) = gap_every {
            if now.duration_since(last_gap) >= period {
                sink.receive_gap();
                last_gap = now;
            }
        }
        if !batch.is_empty() {
            let data = encode_s16le(&batch);
            sink.receive_samples(
                1,
                sample_rate,
                SampleFormat::S16,
                batch.len(),
                &data,
                hrt_time_micro(),
            );
        }
    }
}

/// Resolves the CLI's source names into threaded producers.
pub struct CliSourceFactory {
    gap_every: Option<Duration>,
}

impl CliSourceFactory {
    pub fn new(gap_every: Option<Duration>) -> Self {
        Self { gap_every }
    }

    fn generator(
        &self,
        name: &str,
        sample_rate: u32,
    ) -> Result<(Box<dyn SampleGenerator>, f64), SyncError> {
        let mut parts = name.splitn(2, ':');
        let kind = parts.next().unwrap_or_default();
        let rest = parts.next();
        let (generator, drift_ppm) = match (kind, rest) {
            ("silence", None) => (boxed(SilentGenerator), 0.0),
            ("tone", Some(rest)) => {
                let mut fields = rest.split(':');
                let frequency = parse_number(name, fields.next(), "frequency")?;
                let drift_ppm = match fields.next() {
                    Some(field) => parse_number(name, Some(field), "drift")?,
                    None => 0.0,
                };
                (boxed(ToneGenerator::new(frequency, sample_rate)), drift_ppm)
            }
            ("wav", Some(path)) => (boxed(open_wav(name, path, sample_rate)?), 0.0),
            _ => return Err(SyncError::open_failed(name, "unknown source kind")),
        };
        Ok((generator, drift_ppm))
    }
}

impl SourceFactory for CliSourceFactory {
    fn open(
        &self,
        name: &str,
        sample_rate: u32,
        channels: u16,
    ) -> Result<Box<dyn AudioSource>, SyncError> {
        if channels != 1 {
            return Err(SyncError::open_failed(name, "only mono producers are supported"));
        }
        let (generator, drift_ppm) = self.generator(name, sample_rate)?;
        let target: SinkSlot = Arc::new(Mutex::new(None));
        let stop = Arc::new(AtomicBool::new(false));
        let args = ProducerArgs {
            generator,
            sample_rate,
            drift_ppm,
            gap_every: self.gap_every,
            target: target.clone(),
            stop: stop.clone(),
        };
        let handle = thread::Builder::new()
            .name(format!("producer-{}", name))
            .spawn(move || run_producer(args))
            .map_err(|err| SyncError::open_failed(name, err.to_string()))?;

        Ok(Box::new(ProducerHandle {
            name: name.to_string(),
            target,
            stop,
            handle: Some(handle),
        }))
    }
}

fn parse_number(name: &str, field: Option<&str>, what: &str) -> Result<f64, SyncError> {
    field
        .and_then(|field| field.parse::<f64>().ok())
        .ok_or_else(|| SyncError::open_failed(name, format!("invalid {}", what)))
}

fn open_wav(name: &str, path: &str, sample_rate: u32) -> Result<WavGenerator, SyncError> {
    let reader =
        hound::WavReader::open(path).map_err(|err| SyncError::open_failed(name, err.to_string()))?;
    let spec = reader.spec();
    if spec.channels != 1
        || spec.bits_per_sample != 16
        || spec.sample_format != hound::SampleFormat::Int
    {
        return Err(SyncError::open_failed(
            name,
            "expected a mono 16-bit integer WAV file",
        ));
    }
    if spec.sample_rate != sample_rate {
        warn!(
            "{} is {} Hz but the synchronizer runs at {} Hz; samples are not resampled",
            path, spec.sample_rate, sample_rate
        );
    }
    let samples = reader
        .into_samples::<i16>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| SyncError::open_failed(name, err.to_string()))?;
    Ok(WavGenerator {
        samples,
        position: 0,
    })
}
