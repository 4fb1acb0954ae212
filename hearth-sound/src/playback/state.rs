//! Playback state owned by the soundscape engine

use crate::audio::LayerSource;
use crate::mixes::MixConfig;
use crate::playback::task_slot::TaskSlot;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Engine status
///
/// `Fading` is transient: a fade-in resolves to `Playing`, a fade-out to
/// `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Playing,
    Stopped,
    Fading,
}

impl std::fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackStatus::Idle => write!(f, "idle"),
            PlaybackStatus::Playing => write!(f, "playing"),
            PlaybackStatus::Stopped => write!(f, "stopped"),
            PlaybackStatus::Fading => write!(f, "fading"),
        }
    }
}

/// One instantiated layer of the current mix
pub(crate) struct LiveLayer {
    pub id: String,
    pub gain: f32,
    pub source: Box<dyn LayerSource>,
}

impl LiveLayer {
    /// Apply `gain * master * level`
    pub fn apply(&mut self, master: f32, level: f64) {
        self.source.set_volume(self.gain * master * level as f32);
    }
}

pub(crate) struct EngineState {
    pub status: PlaybackStatus,
    pub current_mix: Option<MixConfig>,
    /// Master volume, 0.0-1.0
    pub volume: f32,
    /// Envelope position of the current fade (1.0 when not attenuated)
    pub level: f64,
    pub layers: Vec<LiveLayer>,
    pub fade: TaskSlot,
    pub timer: TaskSlot,
    pub timer_deadline: Option<Instant>,
}

impl EngineState {
    pub fn new(volume: f32) -> Self {
        Self {
            status: PlaybackStatus::Idle,
            current_mix: None,
            volume,
            level: 1.0,
            layers: Vec::new(),
            fade: TaskSlot::new(),
            timer: TaskSlot::new(),
            timer_deadline: None,
        }
    }

    pub fn apply_level(&mut self) {
        let (master, level) = (self.volume, self.level);
        for layer in &mut self.layers {
            layer.apply(master, level);
        }
    }

    pub fn release_layers(&mut self) {
        for mut layer in self.layers.drain(..) {
            layer.source.release();
        }
    }

    pub fn cancel_timer(&mut self) {
        self.timer.cancel();
        self.timer_deadline = None;
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            status: self.status,
            mix: self.current_mix.as_ref().map(|m| m.id.clone()),
            volume: self.volume,
            layers: self
                .layers
                .iter()
                .map(|l| LayerSnapshot {
                    id: l.id.clone(),
                    volume: l.source.volume(),
                })
                .collect(),
            fade_pending: self.fade.is_pending(),
            timer_remaining_ms: self
                .timer_deadline
                .map(|d| d.saturating_duration_since(Instant::now()).as_millis() as u64),
        }
    }
}

/// Point-in-time view of the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub status: PlaybackStatus,
    pub mix: Option<String>,
    pub volume: f32,
    pub layers: Vec<LayerSnapshot>,
    pub fade_pending: bool,
    pub timer_remaining_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSnapshot {
    pub id: String,
    pub volume: f32,
}
