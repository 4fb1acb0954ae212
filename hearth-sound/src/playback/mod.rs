//! Soundscape playback engine and its state

pub mod engine;
pub mod state;
pub mod task_slot;

pub use engine::{CompletionCallback, SoundscapeEngine, DEFAULT_VOLUME, TIMER_FADE_OUT_MS};
pub use state::{LayerSnapshot, PlaybackSnapshot, PlaybackStatus};
pub use task_slot::TaskSlot;
