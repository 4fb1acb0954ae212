//! Audio backends for soundscape layers
//!
//! The engine only needs "a playable, loopable, volume-controllable handle
//! for this asset". [`backend::LayerBackend`] is that seam; the device
//! backend decodes with symphonia, resamples with rubato and plays through
//! cpal, the silent backend tracks volumes only.

pub mod backend;
pub mod decoder;
pub mod output;
pub mod resampler;

pub use backend::{LayerBackend, LayerSource, SilentBackend};
pub use output::DeviceBackend;
