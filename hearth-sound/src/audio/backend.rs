//! Layer backend seam and the silent backend

use crate::error::Result;
use crate::mixes::LayerConfig;
use tracing::debug;

/// A live, looping audio handle for one layer
pub trait LayerSource: Send {
    /// Begin playback.
    ///
    /// May fail (for example while the output is unavailable). Callers treat
    /// playback as best-effort and ignore the error.
    fn play(&mut self) -> Result<()>;

    /// Set the instantaneous volume (0.0-1.0)
    fn set_volume(&mut self, volume: f32);

    /// Current instantaneous volume
    fn volume(&self) -> f32;

    /// Stop and detach the source. Idempotent.
    fn release(&mut self);
}

/// Factory for layer sources
pub trait LayerBackend: Send + Sync {
    /// Instantiate a source for `layer`. Never fails; an asset that cannot
    /// be loaded yields a silent source.
    fn open(&self, layer: &LayerConfig) -> Box<dyn LayerSource>;
}

/// Backend without an output device
///
/// Used with `--no-audio` and when no device can be opened.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentBackend;

impl LayerBackend for SilentBackend {
    fn open(&self, layer: &LayerConfig) -> Box<dyn LayerSource> {
        debug!("Opening silent source for layer '{}'", layer.id);
        Box::new(SilentSource::default())
    }
}

#[derive(Debug, Default)]
struct SilentSource {
    volume: f32,
    playing: bool,
}

impl LayerSource for SilentSource {
    fn play(&mut self) -> Result<()> {
        self.playing = true;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn release(&mut self) {
        self.playing = false;
    }
}
