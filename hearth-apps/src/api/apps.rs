//! Catalog, visibility and resolution endpoints

use super::{api_error, ApiError};
use crate::entitlements::{is_entitled, upsell_copy, DEFAULT_PLAN};
use crate::error::ResolveError;
use crate::registry::{MicroAppDefinition, VisibilityContext};
use crate::resolver::ResolvedApp;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
pub struct AppListResponse {
    pub apps: Vec<MicroAppDefinition>,
}

#[derive(Debug, Deserialize)]
pub struct UpsellQuery {
    #[serde(default)]
    plan: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpsellResponse {
    entitled: bool,
    message: Option<String>,
}

/// POST /apps/visible - apps visible to the posted context
pub async fn visible_apps(
    State(state): State<AppState>,
    Json(ctx): Json<VisibilityContext>,
) -> Json<AppListResponse> {
    let apps = state.registry.get_visible_apps(&ctx);
    debug!("{} of {} apps visible", apps.len(), state.registry.len());
    Json(AppListResponse { apps })
}

/// POST /apps/:slug/resolve - resolve one app for the posted context
///
/// Unknown and gated apps both answer 404. A registered app without an
/// implementation answers 500.
pub async fn resolve_app(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(ctx): Json<VisibilityContext>,
) -> Result<Json<ResolvedApp>, ApiError> {
    match state.resolver.resolve(&slug, &ctx) {
        Ok(resolved) => Ok(Json(resolved)),
        Err(ResolveError::NotFound(_)) => Err(api_error(StatusCode::NOT_FOUND, "not found")),
        // Logged by the resolver
        Err(e @ ResolveError::UnmappedModule(_)) => Err(api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("error: {}", e),
        )),
    }
}

/// GET /apps/:slug/upsell?plan= - upgrade prompt for a plan
///
/// Only the plan may differ from a resolvable app: unknown slugs and apps
/// behind a disabled flag both answer 404.
pub async fn upsell(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<UpsellQuery>,
) -> Result<Json<UpsellResponse>, ApiError> {
    let app = state
        .resolver
        .flagged_app(&slug, None)
        .map_err(|_| api_error(StatusCode::NOT_FOUND, "not found"))?;
    let plan = query.plan.as_deref().unwrap_or(DEFAULT_PLAN);

    Ok(Json(UpsellResponse {
        entitled: is_entitled(plan, &app),
        message: upsell_copy(&app, plan),
    }))
}
