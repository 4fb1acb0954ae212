//! # Hearth Common Library
//!
//! Shared code for the Hearth services:
//! - Error type
//! - Bootstrap configuration loading
//! - Logging initialization
//! - Feature flag store
//! - Fade envelope calculations

pub mod config;
pub mod envelope;
pub mod error;
pub mod flags;
pub mod logging;

pub use envelope::{linear_envelope_steps, Envelope};
pub use error::{Error, Result};
pub use flags::FlagStore;
