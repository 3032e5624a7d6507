//! Mock producers and consumers shared by unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::SyncError;
use crate::frame::{encode_s16le, SampleFormat, StereoFrame};
use crate::io::{AudioSink, AudioSource, SourceFactory, StereoSink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    Opened(String),
    Connected(String),
    Disconnected(String),
    Dropped(String),
}

type SinkMap = Arc<Mutex<HashMap<String, Arc<dyn AudioSink>>>>;

/// Factory recording every call made on the sources it hands out.
pub struct MockSourceFactory {
    fail_on: Option<String>,
    events: Arc<Mutex<Vec<SourceEvent>>>,
    sinks: SinkMap,
}

impl MockSourceFactory {
    pub fn new() -> Self {
        Self {
            fail_on: None,
            events: Arc::new(Mutex::new(Vec::new())),
            sinks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn failing_on(name: &str) -> Self {
        Self {
            fail_on: Some(name.to_string()),
            ..Self::new()
        }
    }

    pub fn events(&self) -> Vec<SourceEvent> {
        self.events.lock().unwrap().clone()
    }

    /// The sink currently attached to the named source.
    pub fn connected_sink(&self, name: &str) -> Option<Arc<dyn AudioSink>> {
        self.sinks.lock().unwrap().get(name).cloned()
    }
}

impl SourceFactory for MockSourceFactory {
    fn open(
        &self,
        name: &str,
        _sample_rate: u32,
        channels: u16,
    ) -> Result<Box<dyn AudioSource>, SyncError> {
        assert_eq!(channels, 1);
        if self.fail_on.as_deref() == Some(name) {
            return Err(SyncError::open_failed(name, "no such device"));
        }
        self.events
            .lock()
            .unwrap()
            .push(SourceEvent::Opened(name.to_string()));
        Ok(Box::new(MockSource {
            name: name.to_string(),
            events: self.events.clone(),
            sinks: self.sinks.clone(),
        }))
    }
}

struct MockSource {
    name: String,
    events: Arc<Mutex<Vec<SourceEvent>>>,
    sinks: SinkMap,
}

impl AudioSource for MockSource {
    fn connect(&mut self, sink: Option<Arc<dyn AudioSink>>) {
        let mut sinks = self.sinks.lock().unwrap();
        let event = match sink {
            Some(sink) => {
                sinks.insert(self.name.clone(), sink);
                SourceEvent::Connected(self.name.clone())
            }
            None => {
                sinks.remove(&self.name);
                SourceEvent::Disconnected(self.name.clone())
            }
        };
        self.events.lock().unwrap().push(event);
    }
}

impl Drop for MockSource {
    fn drop(&mut self) {
        self.events
            .lock()
            .unwrap()
            .push(SourceEvent::Dropped(self.name.clone()));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutputEvent {
    Frame(StereoFrame),
    Gap,
}

/// Consumer keeping everything it receives.
pub struct RecordingOutput {
    events: Mutex<Vec<OutputEvent>>,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn frames(&self) -> Vec<StereoFrame> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                OutputEvent::Frame(frame) => Some(frame.clone()),
                OutputEvent::Gap => None,
            })
            .collect()
    }

    pub fn gap_count(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| matches!(event, OutputEvent::Gap))
            .count()
    }

    pub fn pair_count(&self) -> usize {
        self.frames().iter().map(|frame| frame.sample_count()).sum()
    }

    /// All frames concatenated.
    pub fn interleaved(&self) -> Vec<i16> {
        self.frames()
            .into_iter()
            .flat_map(|frame| frame.samples)
            .collect()
    }
}

impl StereoSink for RecordingOutput {
    fn push_samples(&self, frame: StereoFrame) -> Result<(), SyncError> {
        self.events.lock().unwrap().push(OutputEvent::Frame(frame));
        Ok(())
    }

    fn push_gap(&self) -> Result<(), SyncError> {
        self.events.lock().unwrap().push(OutputEvent::Gap);
        Ok(())
    }
}

pub struct FailingOutput;

impl StereoSink for FailingOutput {
    fn push_samples(&self, _frame: StereoFrame) -> Result<(), SyncError> {
        Err(SyncError::Output("encoder closed".to_string()))
    }

    fn push_gap(&self) -> Result<(), SyncError> {
        Err(SyncError::Output("encoder closed".to_string()))
    }
}

pub struct PanickingOutput;

impl StereoSink for PanickingOutput {
    fn push_samples(&self, _frame: StereoFrame) -> Result<(), SyncError> {
        panic!("consumer failed");
    }

    fn push_gap(&self) -> Result<(), SyncError> {
        panic!("consumer failed");
    }
}

/// Deliver `samples` as one mono S16LE batch.
pub fn push_samples(sink: &dyn AudioSink, samples: &[i16]) {
    let data = encode_s16le(samples);
    sink.receive_samples(1, 1_000, SampleFormat::S16, samples.len(), &data, 0);
}

/// Poll `condition` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}
