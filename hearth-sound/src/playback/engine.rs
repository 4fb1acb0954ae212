//! Soundscape playback engine
//!
//! Owns the live layer sources of the current mix and drives fades and the
//! auto-stop countdown as tokio tasks. Every control call is synchronous and
//! never fails; deferred work re-enters the engine through [`Shared`] and is
//! discarded if it was superseded in the meantime.

use crate::audio::LayerBackend;
use crate::error::{Error, Result};
use crate::mixes::MixCatalog;
use crate::playback::state::{EngineState, LiveLayer, PlaybackSnapshot, PlaybackStatus};
use crate::playback::task_slot::Generation;
use hearth_common::envelope::{envelope_fraction, envelope_steps, FADE_TICK_MS};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::{interval_at, sleep_until, Instant};
use tracing::{debug, info};

/// Fade length used when the auto-stop timer fires
pub const TIMER_FADE_OUT_MS: u64 = 3000;

/// Default master volume
pub const DEFAULT_VOLUME: f32 = 0.8;

/// Invoked once per fade-out that runs to completion
pub type CompletionCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Fade {
    In,
    /// Fade down from the given level
    Out { from: f64 },
}

enum TickOutcome {
    Continue,
    Finished,
    Completed(Option<CompletionCallback>),
    Superseded,
}

struct Shared {
    state: Mutex<EngineState>,
    catalog: Arc<MixCatalog>,
    backend: Arc<dyn LayerBackend>,
    on_complete: Option<CompletionCallback>,
    runtime: Handle,
}

/// Multi-layer soundscape player
///
/// Dropping the engine cancels pending fades and timers and releases every
/// live source.
pub struct SoundscapeEngine {
    shared: Arc<Shared>,
}

impl SoundscapeEngine {
    /// Create an idle engine.
    ///
    /// Must be called from within a tokio runtime; fades and timers run on it.
    pub fn new(
        catalog: Arc<MixCatalog>,
        backend: Arc<dyn LayerBackend>,
        initial_volume: f32,
        on_complete: Option<CompletionCallback>,
    ) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| Error::Config(format!("Engine requires a tokio runtime: {}", e)))?;
        let volume = if initial_volume.is_nan() {
            DEFAULT_VOLUME
        } else {
            initial_volume.clamp(0.0, 1.0)
        };

        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(EngineState::new(volume)),
                catalog,
                backend,
                on_complete,
                runtime,
            }),
        })
    }

    pub fn catalog(&self) -> &MixCatalog {
        &self.shared.catalog
    }

    /// Start `mix_id`, replacing whatever was playing.
    ///
    /// Unknown mixes are ignored.
    pub fn start(&self, mix_id: &str) {
        let Some(mix) = self.shared.catalog.get(mix_id).cloned() else {
            debug!("Ignoring start of unknown mix '{}'", mix_id);
            return;
        };

        let mut state = self.shared.lock();
        state.fade.cancel();
        state.cancel_timer();
        state.release_layers();
        state.level = 1.0;

        let master = state.volume;
        for layer in &mix.layers {
            let mut source = self.shared.backend.open(layer);
            source.set_volume(layer.gain * master);
            if let Err(e) = source.play() {
                // Autoplay may be blocked until the listener interacts
                debug!("Layer '{}' did not start: {}", layer.id, e);
            }
            state.layers.push(LiveLayer {
                id: layer.id.clone(),
                gain: layer.gain,
                source,
            });
        }

        info!("Started mix '{}' ({} layers)", mix.id, mix.layers.len());
        state.current_mix = Some(mix);
        state.status = PlaybackStatus::Playing;
    }

    /// Cancel pending work and release every source. Never fires the
    /// completion callback.
    pub fn stop(&self) {
        let mut state = self.shared.lock();
        stop_locked(&mut state);
    }

    /// Ramp every layer from silence to its target volume over `duration_ms`.
    pub fn fade_in(&self, duration_ms: u64) {
        let mut state = self.shared.lock();
        if state.layers.is_empty() {
            return;
        }
        state.level = 0.0;
        state.apply_level();
        self.shared.schedule_fade(&mut state, Fade::In, duration_ms);
    }

    /// Ramp every layer down to silence over `duration_ms`, then stop and
    /// fire the completion callback.
    pub fn fade_out(&self, duration_ms: u64) {
        let mut state = self.shared.lock();
        self.shared.fade_out_locked(&mut state, duration_ms);
    }

    /// Set the master volume, clamped to 0.0-1.0. NaN is ignored.
    ///
    /// Live layers jump to `gain * volume`; a running fade picks the new
    /// master up on its next tick.
    pub fn set_volume(&self, volume: f32) {
        if volume.is_nan() {
            debug!("Ignoring NaN volume");
            return;
        }
        let volume = volume.clamp(0.0, 1.0);
        let mut state = self.shared.lock();
        state.volume = volume;
        for layer in &mut state.layers {
            layer.source.set_volume(layer.gain * volume);
        }
    }

    /// Schedule an auto-stop after `minutes`, replacing any earlier timer.
    ///
    /// `None` or a non-positive value only clears the current timer.
    pub fn set_timer(&self, minutes: Option<f64>) {
        let mut state = self.shared.lock();
        state.cancel_timer();

        let Some(minutes) = minutes.filter(|m| *m > 0.0) else {
            debug!("Auto-stop timer cleared");
            return;
        };
        let Ok(duration) = Duration::try_from_secs_f64(minutes * 60.0) else {
            debug!("Ignoring unrepresentable timer of {} minutes", minutes);
            return;
        };
        let Some(deadline) = Instant::now().checked_add(duration) else {
            debug!("Ignoring unrepresentable timer of {} minutes", minutes);
            return;
        };

        let weak = Arc::downgrade(&self.shared);
        let runtime = self.shared.runtime.clone();
        state
            .timer
            .replace(|token| runtime.spawn(run_timer(weak, token, deadline)));
        state.timer_deadline = Some(deadline);
        info!("Auto-stop timer set for {} minutes", minutes);
    }

    /// Cancel everything and release all sources. Equivalent to `stop`;
    /// also runs on drop.
    pub fn shutdown(&self) {
        self.stop();
    }

    pub fn status(&self) -> PlaybackStatus {
        self.shared.lock().status
    }

    pub fn volume(&self) -> f32 {
        self.shared.lock().volume
    }

    /// Number of instantiated layer sources
    pub fn live_sources(&self) -> usize {
        self.shared.lock().layers.len()
    }

    pub fn current_mix_id(&self) -> Option<String> {
        self.shared.lock().current_mix.as_ref().map(|m| m.id.clone())
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.shared.lock().snapshot()
    }
}

impl Drop for SoundscapeEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fade_out_locked(self: &Arc<Self>, state: &mut EngineState, duration_ms: u64) {
        if state.layers.is_empty() {
            return;
        }
        let from = state.level;
        self.schedule_fade(state, Fade::Out { from }, duration_ms);
    }

    fn schedule_fade(self: &Arc<Self>, state: &mut EngineState, fade: Fade, duration_ms: u64) {
        let steps = envelope_steps(duration_ms, FADE_TICK_MS);
        let weak = Arc::downgrade(self);
        let runtime = self.runtime.clone();
        state
            .fade
            .replace(|token| runtime.spawn(run_fade(weak, token, fade, steps)));
        state.status = PlaybackStatus::Fading;
        debug!("Scheduled {:?} over {} ticks", fade, steps);
    }

    fn fade_tick(&self, token: Generation, fade: Fade, tick: u64, steps: u64) -> TickOutcome {
        let mut state = self.lock();
        if !state.fade.is_current(token) {
            return TickOutcome::Superseded;
        }

        let fraction = envelope_fraction(tick, steps);
        state.level = match fade {
            Fade::In => fraction,
            Fade::Out { from } => from * (1.0 - fraction),
        };
        state.apply_level();

        if tick < steps {
            return TickOutcome::Continue;
        }

        state.fade.finish(token);
        match fade {
            Fade::In => {
                state.level = 1.0;
                state.status = PlaybackStatus::Playing;
                TickOutcome::Finished
            }
            Fade::Out { .. } => {
                stop_locked(&mut state);
                TickOutcome::Completed(self.on_complete.clone())
            }
        }
    }

    fn timer_fired(self: &Arc<Self>, token: Generation) {
        let mut state = self.lock();
        if !state.timer.finish(token) {
            return;
        }
        state.timer_deadline = None;
        info!("Auto-stop timer fired");
        self.fade_out_locked(&mut state, TIMER_FADE_OUT_MS);
    }
}

fn stop_locked(state: &mut EngineState) {
    state.fade.cancel();
    state.cancel_timer();
    state.release_layers();
    state.current_mix = None;
    state.level = 1.0;
    state.status = PlaybackStatus::Stopped;
}

async fn run_fade(weak: Weak<Shared>, token: Generation, fade: Fade, steps: u64) {
    let period = Duration::from_millis(FADE_TICK_MS);
    let mut ticker = interval_at(Instant::now() + period, period);

    for tick in 1..=steps {
        ticker.tick().await;
        let Some(shared) = weak.upgrade() else {
            return;
        };
        match shared.fade_tick(token, fade, tick, steps) {
            TickOutcome::Continue => {}
            TickOutcome::Finished | TickOutcome::Superseded => return,
            TickOutcome::Completed(callback) => {
                info!("Fade-out complete");
                drop(shared);
                if let Some(callback) = callback {
                    callback();
                }
                return;
            }
        }
    }
}

async fn run_timer(weak: Weak<Shared>, token: Generation, deadline: Instant) {
    sleep_until(deadline).await;
    if let Some(shared) = weak.upgrade() {
        shared.timer_fired(token);
    }
}
