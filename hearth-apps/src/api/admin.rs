//! Operator endpoints: full catalog and process-wide flags
//!
//! These bypass the visibility gates, so they are served only on the
//! loopback admin listener, never on the request-facing router.

use super::apps::AppListResponse;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct SetFlagRequest {
    enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct FlagResponse {
    name: String,
    enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct FlagListResponse {
    flags: BTreeMap<String, bool>,
}

/// GET /admin/apps - every registered app in registration order
pub async fn list_apps(State(state): State<AppState>) -> Json<AppListResponse> {
    Json(AppListResponse {
        apps: state.registry.get_apps(),
    })
}

/// GET /admin/flags
pub async fn list_flags(State(state): State<AppState>) -> Json<FlagListResponse> {
    Json(FlagListResponse {
        flags: state.registry.flags().snapshot(),
    })
}

/// PUT /admin/flags/:name
pub async fn set_flag(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<SetFlagRequest>,
) -> Json<FlagResponse> {
    info!("Flag '{}' set to {}", name, request.enabled);
    state.registry.flags().expose_flag(&name, request.enabled);
    Json(FlagResponse {
        name,
        enabled: request.enabled,
    })
}
