//! App resolution gate
//!
//! Decides whether a requested slug may be rendered and which implementation
//! module renders it. This is the coarse server-side check: it applies the
//! flag and plan gates but not the per-child age-band gating, which the app's
//! own page applies.

use crate::builtin::AppModule;
use crate::entitlements::is_entitled;
use crate::error::ResolveError;
use crate::registry::{AppRegistry, MicroAppDefinition, VisibilityContext};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};

/// Successfully resolved app
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedApp {
    pub slug: String,
    pub title: String,
    pub route: String,
    pub module: AppModule,
}

/// Resolution gate over a shared registry
#[derive(Clone)]
pub struct AppResolver {
    registry: Arc<AppRegistry>,
}

impl AppResolver {
    pub fn new(registry: Arc<AppRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<AppRegistry> {
        &self.registry
    }

    /// Look up `slug` behind its feature flag.
    ///
    /// An app whose flag is off is reported exactly like an unknown slug, so
    /// every surface built on this cannot be used to probe the catalog.
    pub fn flagged_app(
        &self,
        slug: &str,
        overrides: Option<&HashMap<String, bool>>,
    ) -> Result<MicroAppDefinition, ResolveError> {
        let app = self
            .registry
            .get_app_by_slug(slug)
            .ok_or_else(|| ResolveError::NotFound(slug.to_string()))?;

        let flag_ok = app
            .feature_flag
            .as_deref()
            .map_or(true, |flag| self.registry.flags().get_flag(flag, overrides));
        if !flag_ok {
            debug!("App '{}' gated by its feature flag", slug);
            return Err(ResolveError::NotFound(slug.to_string()));
        }

        Ok(app)
    }

    /// Resolve `slug` for the caller described by `ctx`.
    ///
    /// # Errors
    /// - [`ResolveError::NotFound`] when the slug is unknown or a gate fails
    /// - [`ResolveError::UnmappedModule`] when the slug has no implementation
    pub fn resolve(&self, slug: &str, ctx: &VisibilityContext) -> Result<ResolvedApp, ResolveError> {
        let app = self.flagged_app(slug, ctx.flags.as_ref())?;

        if !is_entitled(ctx.plan(), &app) {
            debug!("App '{}' not included in plan '{}'", slug, ctx.plan());
            return Err(ResolveError::NotFound(slug.to_string()));
        }

        let module = AppModule::for_slug(&app.slug).ok_or_else(|| {
            error!("App '{}' is registered without an implementation module", app.slug);
            ResolveError::UnmappedModule(app.slug.clone())
        })?;

        Ok(ResolvedApp {
            slug: app.slug,
            title: app.title,
            route: app.route,
            module,
        })
    }
}
