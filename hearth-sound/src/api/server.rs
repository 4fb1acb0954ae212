//! HTTP server setup and routing

use crate::api::handlers;
use crate::playback::{CompletionCallback, SoundscapeEngine};
use axum::{
    routing::{get, post},
    Router,
};
use hearth_common::config::SoundscapeSettings;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub engine: Arc<SoundscapeEngine>,
    /// Fade-outs that ran to completion
    pub completed: Arc<AtomicU64>,
    /// Default fade lengths
    pub settings: SoundscapeSettings,
}

impl AppContext {
    pub fn new(
        engine: Arc<SoundscapeEngine>,
        completed: Arc<AtomicU64>,
        settings: SoundscapeSettings,
    ) -> Self {
        Self {
            engine,
            completed,
            settings,
        }
    }
}

/// Completion callback that logs and counts finished mixes
pub fn completion_counter(counter: Arc<AtomicU64>) -> CompletionCallback {
    Arc::new(move || {
        let total = counter.fetch_add(1, Ordering::SeqCst) + 1;
        info!(completed = total, "soundscape completed");
    })
}

/// Build the control router
pub fn build_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/mixes", get(handlers::list_mixes))
        .route("/soundscape/state", get(handlers::get_state))
        .route("/soundscape/start", post(handlers::start))
        .route("/soundscape/stop", post(handlers::stop))
        .route("/soundscape/fade-in", post(handlers::fade_in))
        .route("/soundscape/fade-out", post(handlers::fade_out))
        .route("/soundscape/volume", post(handlers::set_volume))
        .route("/soundscape/timer", post(handlers::set_timer))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
