//! hearth-apps library - Micro-app catalog and resolution gate
//!
//! Holds the registry of micro-apps, decides which apps a user may see, and
//! resolves a requested slug to the module that renders it.

use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod builtin;
pub mod entitlements;
pub mod error;
pub mod registry;
pub mod resolver;

pub use builtin::{register_builtin_apps, AppModule};
pub use error::ResolveError;
pub use registry::{AppRegistry, MicroAppDefinition, Role, VisibilityContext};
pub use resolver::{AppResolver, ResolvedApp};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Micro-app catalog
    pub registry: Arc<AppRegistry>,
    /// Resolution gate over the same catalog
    pub resolver: AppResolver,
}

impl AppState {
    /// Create new application state
    pub fn new(registry: Arc<AppRegistry>) -> Self {
        let resolver = AppResolver::new(Arc::clone(&registry));
        Self { registry, resolver }
    }
}

/// Build the request-facing router
///
/// Every app-specific route applies the same gates as the resolver, so a
/// gated app is indistinguishable from an unknown one.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/apps/visible", post(api::apps::visible_apps))
        .route("/apps/:slug/resolve", post(api::apps::resolve_app))
        .route("/apps/:slug/upsell", get(api::apps::upsell))
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Build the operator router (full catalog, flag writes)
///
/// Served on a separate loopback listener, without CORS.
pub fn build_admin_router(state: AppState) -> Router {
    use axum::routing::{get, put};

    Router::new()
        .route("/admin/apps", get(api::admin::list_apps))
        .route("/admin/flags", get(api::admin::list_flags))
        .route("/admin/flags/:name", put(api::admin::set_flag))
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
