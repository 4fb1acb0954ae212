//! Linear fade envelopes
//!
//! Fades are driven by a fixed-interval tick. For a fade of `duration_ms`
//! ticked every `interval_ms`, the number of ticks is
//! `max(1, floor(duration_ms / interval_ms))` and the gain fraction reached
//! after tick `n` (1-based) is `min(1, n / steps)`.
//!
//! The final tick always lands on exactly 1.0 and earlier ticks are strictly
//! increasing, so a fade-in ends at full gain and a fade-out (`1 - fraction`)
//! ends at exact silence.

use serde::{Deserialize, Serialize};

/// Tick interval used by soundscape fades
pub const FADE_TICK_MS: u64 = 50;

/// Normalized linear envelope
///
/// `values[i]` is the gain fraction after tick `i + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Number of discrete ticks in the fade
    pub steps: u64,
    /// Gain fraction after each tick, length `steps`
    pub values: Vec<f64>,
}

/// Number of ticks for a fade of `duration_ms` at `interval_ms` per tick.
///
/// Never less than one. A zero interval is treated as a single-step fade.
pub fn envelope_steps(duration_ms: u64, interval_ms: u64) -> u64 {
    duration_ms.checked_div(interval_ms).unwrap_or(0).max(1)
}

/// Gain fraction reached after `tick` of `steps` ticks, saturating at 1.0.
pub fn envelope_fraction(tick: u64, steps: u64) -> f64 {
    if steps == 0 {
        return 1.0;
    }
    (tick as f64 / steps as f64).min(1.0)
}

/// Compute the linear envelope for a fade.
///
/// # Examples
///
/// ```
/// use hearth_common::linear_envelope_steps;
///
/// let env = linear_envelope_steps(1000, 100);
/// assert_eq!(env.steps, 10);
/// assert!((env.values[0] - 0.1).abs() < 1e-9);
/// assert_eq!(env.values[9], 1.0);
/// ```
pub fn linear_envelope_steps(duration_ms: u64, interval_ms: u64) -> Envelope {
    let steps = envelope_steps(duration_ms, interval_ms);
    let values = (1..=steps).map(|tick| envelope_fraction(tick, steps)).collect();
    Envelope { steps, values }
}
