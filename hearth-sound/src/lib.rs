//! # Hearth Soundscapes Library (hearth-sound)
//!
//! Layered soundscape player: a catalog of named mixes, a playback engine
//! with linear fades and an auto-stop timer, and an HTTP control surface.
//!
//! **Architecture:** symphonia decode + rubato resample into a cpal mixing
//! stream, behind a [`audio::LayerBackend`] seam so the engine also runs
//! without an output device.

pub mod api;
pub mod audio;
pub mod error;
pub mod mixes;
pub mod playback;

pub use error::{Error, Result};
pub use mixes::{LayerConfig, LayerType, MixCatalog, MixConfig};
pub use playback::{CompletionCallback, PlaybackSnapshot, PlaybackStatus, SoundscapeEngine};
