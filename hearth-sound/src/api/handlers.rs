//! HTTP request handlers
//!
//! Every control endpoint answers with the engine state after the call.

use crate::api::AppContext;
use crate::mixes::MixConfig;
use crate::playback::PlaybackSnapshot;
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;
use tracing::{debug, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct MixListResponse {
    mixes: Vec<MixConfig>,
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    #[serde(flatten)]
    playback: PlaybackSnapshot,
    /// Fade-outs that ran to completion since startup
    completed: u64,
}

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    mix_id: String,
    /// Fade-in length; configured default when absent, no fade when 0
    #[serde(default)]
    fade_in_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StopRequest {
    /// Fade out over this many ms instead of stopping at once
    #[serde(default)]
    fade_out_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FadeRequest {
    #[serde(default)]
    ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct VolumeRequest {
    volume: f32,
}

#[derive(Debug, Default, Deserialize)]
pub struct TimerRequest {
    /// Minutes until auto-stop; absent or <= 0 clears the timer
    #[serde(default)]
    minutes: Option<f64>,
}

type ApiError = (StatusCode, Json<StatusResponse>);

fn state_response(ctx: &AppContext) -> Json<StateResponse> {
    Json(StateResponse {
        playback: ctx.engine.snapshot(),
        completed: ctx.completed.load(Ordering::SeqCst),
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "hearth-sound".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /mixes
pub async fn list_mixes(State(ctx): State<AppContext>) -> Json<MixListResponse> {
    Json(MixListResponse {
        mixes: ctx.engine.catalog().mixes().to_vec(),
    })
}

/// GET /soundscape/state
pub async fn get_state(State(ctx): State<AppContext>) -> Json<StateResponse> {
    state_response(&ctx)
}

/// POST /soundscape/start
///
/// Unknown mixes leave the engine untouched and answer 404.
pub async fn start(
    State(ctx): State<AppContext>,
    Json(req): Json<StartRequest>,
) -> Result<Json<StateResponse>, ApiError> {
    if ctx.engine.catalog().get(&req.mix_id).is_none() {
        debug!("Start requested for unknown mix '{}'", req.mix_id);
        return Err((
            StatusCode::NOT_FOUND,
            Json(StatusResponse {
                status: format!("unknown mix: {}", req.mix_id),
            }),
        ));
    }

    info!("Start mix: {}", req.mix_id);
    ctx.engine.start(&req.mix_id);

    let fade_in_ms = req.fade_in_ms.unwrap_or(ctx.settings.start_fade_in_ms);
    if fade_in_ms > 0 {
        ctx.engine.fade_in(fade_in_ms);
    }

    Ok(state_response(&ctx))
}

/// POST /soundscape/stop
pub async fn stop(
    State(ctx): State<AppContext>,
    Json(req): Json<StopRequest>,
) -> Json<StateResponse> {
    match req.fade_out_ms {
        Some(ms) => {
            info!("Stop with {}ms fade-out", ms);
            ctx.engine.fade_out(ms);
        }
        None => {
            info!("Stop");
            ctx.engine.stop();
        }
    }
    state_response(&ctx)
}

/// POST /soundscape/fade-in
pub async fn fade_in(
    State(ctx): State<AppContext>,
    Json(req): Json<FadeRequest>,
) -> Json<StateResponse> {
    ctx.engine
        .fade_in(req.ms.unwrap_or(ctx.settings.start_fade_in_ms));
    state_response(&ctx)
}

/// POST /soundscape/fade-out
pub async fn fade_out(
    State(ctx): State<AppContext>,
    Json(req): Json<FadeRequest>,
) -> Json<StateResponse> {
    ctx.engine
        .fade_out(req.ms.unwrap_or(ctx.settings.stop_fade_out_ms));
    state_response(&ctx)
}

/// POST /soundscape/volume
pub async fn set_volume(
    State(ctx): State<AppContext>,
    Json(req): Json<VolumeRequest>,
) -> Json<StateResponse> {
    debug!("Set volume: {}", req.volume);
    ctx.engine.set_volume(req.volume);
    state_response(&ctx)
}

/// POST /soundscape/timer
pub async fn set_timer(
    State(ctx): State<AppContext>,
    Json(req): Json<TimerRequest>,
) -> Json<StateResponse> {
    ctx.engine.set_timer(req.minutes);
    state_response(&ctx)
}
