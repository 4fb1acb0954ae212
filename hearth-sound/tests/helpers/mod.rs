//! Shared test utilities

#![allow(dead_code)]

pub mod audio_generator;

use hearth_sound::audio::{LayerBackend, LayerSource};
use hearth_sound::{Error, LayerConfig, MixCatalog, SoundscapeEngine};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Everything one source saw
#[derive(Debug, Default, Clone)]
pub struct SourceRecord {
    pub layer_id: String,
    pub volume: f32,
    pub volume_history: Vec<f32>,
    pub play_calls: usize,
    pub released: bool,
}

/// Backend that records every call, optionally refusing to play
#[derive(Default)]
pub struct RecordingBackend {
    sources: Mutex<Vec<Arc<Mutex<SourceRecord>>>>,
    block_autoplay: AtomicBool,
}

impl RecordingBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every subsequent `play()` fail
    pub fn block_autoplay(&self) {
        self.block_autoplay.store(true, Ordering::SeqCst);
    }

    /// Snapshot of every source opened so far, in open order
    pub fn records(&self) -> Vec<SourceRecord> {
        self.sources
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.lock().unwrap().clone())
            .collect()
    }

    pub fn opened(&self) -> usize {
        self.sources.lock().unwrap().len()
    }

    /// Sources not yet released
    pub fn live(&self) -> Vec<SourceRecord> {
        self.records().into_iter().filter(|r| !r.released).collect()
    }
}

impl LayerBackend for RecordingBackend {
    fn open(&self, layer: &LayerConfig) -> Box<dyn LayerSource> {
        let record = Arc::new(Mutex::new(SourceRecord {
            layer_id: layer.id.clone(),
            ..Default::default()
        }));
        self.sources.lock().unwrap().push(Arc::clone(&record));
        Box::new(RecordingSource {
            record,
            block_autoplay: self.block_autoplay.load(Ordering::SeqCst),
        })
    }
}

struct RecordingSource {
    record: Arc<Mutex<SourceRecord>>,
    block_autoplay: bool,
}

impl LayerSource for RecordingSource {
    fn play(&mut self) -> hearth_sound::Result<()> {
        let mut record = self.record.lock().unwrap();
        record.play_calls += 1;
        if self.block_autoplay {
            return Err(Error::AudioOutput("autoplay blocked".to_string()));
        }
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        let mut record = self.record.lock().unwrap();
        record.volume = volume;
        record.volume_history.push(volume);
    }

    fn volume(&self) -> f32 {
        self.record.lock().unwrap().volume
    }

    fn release(&mut self) {
        self.record.lock().unwrap().released = true;
    }
}

/// Engine over the built-in catalog and a recording backend, counting
/// completion callbacks
pub fn recording_engine(volume: f32) -> (SoundscapeEngine, Arc<RecordingBackend>, Arc<AtomicUsize>) {
    let backend = RecordingBackend::new();
    let completions = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&completions);
    let engine = SoundscapeEngine::new(
        Arc::new(MixCatalog::builtin()),
        backend.clone(),
        volume,
        Some(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })),
    )
    .expect("engine inside runtime");
    (engine, backend, completions)
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}
