//! Error types for hearth-sound
//!
//! Playback control itself never fails: unknown mixes, redundant stops and
//! blocked autoplay are no-ops. These errors cover service startup and the
//! audio backend, whose `play` failures the engine discards.

use thiserror::Error;

/// Main error type for hearth-sound module
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration and setup errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Audio decoding errors
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Audio output device errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using hearth-sound Error
pub type Result<T> = std::result::Result<T, Error>;
