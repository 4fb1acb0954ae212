//! Audio output using cpal
//!
//! A single output stream mixes every live voice. The stream is not `Send`,
//! so it is built and owned by a dedicated thread that lives until the
//! backend is dropped.

use crate::audio::backend::{LayerBackend, LayerSource};
use crate::audio::decoder::decode_file;
use crate::audio::resampler::Resampler;
use crate::error::{Error, Result};
use crate::mixes::LayerConfig;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::thread::JoinHandle;
use tracing::{debug, error, info, warn};

/// Decoded, device-rate stereo samples for one asset
type AssetSamples = Arc<Vec<f32>>;

/// Decoded assets keyed by file reference
///
/// Assets are short loops shared between mixes (pink noise appears in two),
/// so each is decoded at most once per process.
#[derive(Default)]
struct AssetCache {
    assets: Mutex<HashMap<String, AssetSamples>>,
}

impl AssetCache {
    fn get(&self, file: &str) -> Option<AssetSamples> {
        self.assets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(file)
            .cloned()
    }

    fn insert(&self, file: &str, samples: AssetSamples) {
        self.assets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(file.to_string(), samples);
    }
}

/// Loop region in frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LoopRegion {
    start: usize,
    end: usize,
}

impl LoopRegion {
    /// Convert optional loop bounds in seconds to frames, falling back to the
    /// whole asset when a bound is missing or the region is empty.
    fn from_bounds(
        loop_start: Option<f64>,
        loop_end: Option<f64>,
        sample_rate: u32,
        frames: usize,
    ) -> Self {
        let to_frame = |secs: f64| ((secs.max(0.0) * sample_rate as f64) as usize).min(frames);
        let start = loop_start.map_or(0, to_frame);
        let end = loop_end.map_or(frames, to_frame);
        if end <= start {
            Self { start: 0, end: frames }
        } else {
            Self { start, end }
        }
    }
}

struct VoiceAsset {
    samples: AssetSamples,
    region: LoopRegion,
}

/// One looping layer inside the mixer
struct Voice {
    asset: OnceLock<VoiceAsset>,
    /// f32 bits
    gain: AtomicU32,
    playing: AtomicBool,
    released: AtomicBool,
    /// Next frame to render
    cursor: AtomicUsize,
}

impl Voice {
    fn new() -> Self {
        Self {
            asset: OnceLock::new(),
            gain: AtomicU32::new(0f32.to_bits()),
            playing: AtomicBool::new(false),
            released: AtomicBool::new(false),
            cursor: AtomicUsize::new(0),
        }
    }

    fn gain(&self) -> f32 {
        f32::from_bits(self.gain.load(Ordering::Relaxed))
    }

    /// Add this voice's next `out.len() / 2` frames into `out`.
    fn mix_into(&self, out: &mut [f32]) {
        if !self.playing.load(Ordering::Acquire) {
            return;
        }
        let Some(asset) = self.asset.get() else {
            return;
        };
        let region = asset.region;
        if region.end == 0 {
            return;
        }

        let gain = self.gain();
        let mut cursor = self.cursor.load(Ordering::Relaxed);
        for frame in out.chunks_exact_mut(2) {
            if cursor >= region.end {
                cursor = region.start;
            }
            frame[0] += asset.samples[cursor * 2] * gain;
            frame[1] += asset.samples[cursor * 2 + 1] * gain;
            cursor += 1;
        }
        self.cursor.store(cursor, Ordering::Relaxed);
    }
}

/// Voices currently attached to the output stream
#[derive(Default)]
struct Mixer {
    voices: Mutex<Vec<Arc<Voice>>>,
}

impl Mixer {
    fn attach(&self, voice: Arc<Voice>) {
        self.voices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(voice);
    }

    /// Render interleaved stereo into `scratch`, dropping released voices.
    fn render(&self, scratch: &mut [f32]) {
        scratch.fill(0.0);
        let mut voices = self.voices.lock().unwrap_or_else(PoisonError::into_inner);
        voices.retain(|v| !v.released.load(Ordering::Acquire));
        for voice in voices.iter() {
            voice.mix_into(scratch);
        }
    }

    fn voice_count(&self) -> usize {
        self.voices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Backend that plays layers on the default output device
pub struct DeviceBackend {
    assets_root: PathBuf,
    sample_rate: u32,
    mixer: Arc<Mixer>,
    cache: Arc<AssetCache>,
    error_flag: Arc<AtomicBool>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    stream_thread: Option<JoinHandle<()>>,
}

impl DeviceBackend {
    /// Open the default output device and start the mixing stream.
    ///
    /// # Errors
    /// - No output device available
    /// - Device has no usable configuration
    /// - Stream could not be built or started
    pub fn new(assets_root: impl Into<PathBuf>) -> Result<Self> {
        let mixer = Arc::new(Mixer::default());
        let error_flag = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel::<Result<u32>>();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let thread_mixer = Arc::clone(&mixer);
        let thread_error_flag = Arc::clone(&error_flag);
        let stream_thread = std::thread::Builder::new()
            .name("hearth-audio-out".to_string())
            .spawn(move || {
                let stream = match open_stream(thread_mixer, thread_error_flag) {
                    Ok((stream, rate)) => {
                        let _ = ready_tx.send(Ok(rate));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                // Hold the stream until the backend is dropped
                let _ = shutdown_rx.recv();
                if let Err(e) = stream.pause() {
                    debug!("Failed to pause stream on shutdown: {}", e);
                }
                drop(stream);
                debug!("Audio output thread exiting");
            })?;

        let sample_rate = match ready_rx.recv() {
            Ok(Ok(rate)) => rate,
            Ok(Err(e)) => {
                let _ = stream_thread.join();
                return Err(e);
            }
            Err(_) => {
                let _ = stream_thread.join();
                return Err(Error::AudioOutput(
                    "Audio output thread exited before reporting".to_string(),
                ));
            }
        };

        info!("Audio output started at {}Hz", sample_rate);

        Ok(Self {
            assets_root: assets_root.into(),
            sample_rate,
            mixer,
            cache: Arc::new(AssetCache::default()),
            error_flag,
            shutdown_tx: Some(shutdown_tx),
            stream_thread: Some(stream_thread),
        })
    }

    /// Device sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Voices still attached to the mixer (released voices are dropped on the
    /// next audio callback)
    pub fn voice_count(&self) -> usize {
        self.mixer.voice_count()
    }

    /// Decode `files` in the background so the first start of a mix is not
    /// silent while its assets decode.
    pub fn preload<'a>(&self, files: impl IntoIterator<Item = &'a str>) {
        for file in files {
            let file = file.to_string();
            let root = self.assets_root.clone();
            let cache = Arc::clone(&self.cache);
            let rate = self.sample_rate;
            let spawned = std::thread::Builder::new()
                .name("hearth-preload".to_string())
                .spawn(move || {
                    if cache.get(&file).is_some() {
                        return;
                    }
                    match load_asset(&root, &file, rate) {
                        Ok(samples) => cache.insert(&file, samples),
                        Err(e) => warn!("Failed to preload {}: {}", file, e),
                    }
                });
            if let Err(e) = spawned {
                warn!("Failed to spawn preload thread: {}", e);
            }
        }
    }
}

impl LayerBackend for DeviceBackend {
    fn open(&self, layer: &LayerConfig) -> Box<dyn LayerSource> {
        let voice = Arc::new(Voice::new());
        self.mixer.attach(Arc::clone(&voice));

        let file = layer.file.clone();
        let root = self.assets_root.clone();
        let cache = Arc::clone(&self.cache);
        let rate = self.sample_rate;
        let (loop_start, loop_end) = (layer.loop_start, layer.loop_end);
        let decode_voice = Arc::clone(&voice);

        let spawned = std::thread::Builder::new()
            .name("hearth-decode".to_string())
            .spawn(move || {
                let samples = match cache.get(&file) {
                    Some(samples) => samples,
                    None => match load_asset(&root, &file, rate) {
                        Ok(samples) => {
                            cache.insert(&file, Arc::clone(&samples));
                            samples
                        }
                        Err(e) => {
                            warn!("Layer asset {} unavailable, voice stays silent: {}", file, e);
                            return;
                        }
                    },
                };
                let region = LoopRegion::from_bounds(loop_start, loop_end, rate, samples.len() / 2);
                let _ = decode_voice.asset.set(VoiceAsset { samples, region });
            });
        if let Err(e) = spawned {
            warn!("Failed to spawn decode thread for {}: {}", layer.file, e);
        }

        Box::new(DeviceSource {
            voice,
            error_flag: Arc::clone(&self.error_flag),
        })
    }
}

impl Drop for DeviceBackend {
    fn drop(&mut self) {
        // Closing the channel wakes the stream thread
        self.shutdown_tx.take();
        if let Some(handle) = self.stream_thread.take() {
            if handle.join().is_err() {
                warn!("Audio output thread panicked");
            }
        }
    }
}

struct DeviceSource {
    voice: Arc<Voice>,
    error_flag: Arc<AtomicBool>,
}

impl LayerSource for DeviceSource {
    fn play(&mut self) -> Result<()> {
        if self.error_flag.load(Ordering::SeqCst) {
            return Err(Error::AudioOutput("Output stream is in error state".to_string()));
        }
        self.voice.playing.store(true, Ordering::Release);
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.voice
            .gain
            .store(volume.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }

    fn volume(&self) -> f32 {
        self.voice.gain()
    }

    fn release(&mut self) {
        self.voice.playing.store(false, Ordering::Release);
        self.voice.released.store(true, Ordering::Release);
    }
}

impl Drop for DeviceSource {
    fn drop(&mut self) {
        self.release();
    }
}

/// Decode `file` under `root` and resample it to `rate`.
fn load_asset(root: &Path, file: &str, rate: u32) -> Result<AssetSamples> {
    let path = root.join(file.trim_start_matches('/'));
    let decoded = decode_file(&path)?;
    let samples = Resampler::resample_stereo(&decoded.samples, decoded.sample_rate, rate)?;
    debug!("Loaded asset {} ({} frames)", file, samples.len() / 2);
    Ok(Arc::new(samples))
}

/// Build and start the output stream; returns it with its sample rate.
fn open_stream(mixer: Arc<Mixer>, error_flag: Arc<AtomicBool>) -> Result<(Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| Error::AudioOutput("No default output device found".to_string()))?;

    let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    info!("Using default audio device: {}", name);

    let (config, sample_format) = best_config(&device)?;
    debug!(
        "Audio config: sample_rate={}, channels={}, format={:?}",
        config.sample_rate.0, config.channels, sample_format
    );

    let stream = match sample_format {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, mixer, error_flag)?,
        SampleFormat::I16 => build_stream::<i16>(&device, &config, mixer, error_flag)?,
        SampleFormat::U16 => build_stream::<u16>(&device, &config, mixer, error_flag)?,
        other => {
            return Err(Error::AudioOutput(format!(
                "Unsupported sample format: {:?}",
                other
            )))
        }
    };

    stream
        .play()
        .map_err(|e| Error::AudioOutput(format!("Failed to start stream: {}", e)))?;

    Ok((stream, config.sample_rate.0))
}

/// Prefer 44.1kHz stereo f32, else the device default.
fn best_config(device: &Device) -> Result<(StreamConfig, SampleFormat)> {
    let mut supported_configs = device
        .supported_output_configs()
        .map_err(|e| Error::AudioOutput(format!("Failed to get device configs: {}", e)))?;

    let preferred = supported_configs.find(|config| {
        config.channels() == 2
            && config.min_sample_rate().0 <= 44100
            && config.max_sample_rate().0 >= 44100
            && config.sample_format() == SampleFormat::F32
    });

    if let Some(supported_config) = preferred {
        let sample_format = supported_config.sample_format();
        let config = supported_config
            .with_sample_rate(cpal::SampleRate(44100))
            .config();
        return Ok((config, sample_format));
    }

    let supported_config = device
        .default_output_config()
        .map_err(|e| Error::AudioOutput(format!("Failed to get default config: {}", e)))?;
    let sample_format = supported_config.sample_format();
    Ok((supported_config.config(), sample_format))
}

fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    mixer: Arc<Mixer>,
    error_flag: Arc<AtomicBool>,
) -> Result<Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let mut scratch: Vec<f32> = Vec::new();

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let frames = data.len() / channels.max(1);
                scratch.resize(frames * 2, 0.0);
                mixer.render(&mut scratch);

                for (frame, mixed) in data.chunks_mut(channels).zip(scratch.chunks_exact(2)) {
                    let left = mixed[0].clamp(-1.0, 1.0);
                    let right = mixed[1].clamp(-1.0, 1.0);
                    match frame.len() {
                        0 => {}
                        1 => frame[0] = T::from_sample((left + right) * 0.5),
                        _ => {
                            frame[0] = T::from_sample(left);
                            frame[1] = T::from_sample(right);
                            for extra in &mut frame[2..] {
                                *extra = T::from_sample(0.0f32);
                            }
                        }
                    }
                }
            },
            move |err| {
                error!("Audio stream error: {}", err);
                error_flag.store(true, Ordering::SeqCst);
            },
            None,
        )
        .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))
}
