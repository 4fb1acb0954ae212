//! Micro-app registry
//!
//! Catalog of micro-app definitions plus the visibility query that decides
//! which apps a given user/child/flag context may see.
//!
//! The registry is an explicit value: construct one at startup, register the
//! built-in apps into it, and share it by `Arc`. Registration is additive and
//! idempotent by `id`; definitions are never mutated once registered.

use crate::entitlements::{is_entitled, DEFAULT_PLAN};
use hearth_common::FlagStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// Role of the acting user within a family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Caregiver,
    Child,
}

/// Tile icon, passed through untouched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AppIcon {
    /// Plain text label (emoji, initials)
    Text(String),
    /// Handle of a renderable owned by the presentation layer
    Renderable(String),
}

/// Dashboard placement for an app tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DashboardSlot {
    Home,
    Kid,
    Summary,
}

/// Static registration record for a micro-app
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicroAppDefinition {
    /// Unique key within the registry
    pub id: String,
    /// Routing key
    pub slug: String,
    pub title: String,
    pub icon: AppIcon,
    pub route: String,
    pub allowed_roles: Vec<Role>,
    /// Plans entitled to the app; empty means unrestricted
    #[serde(default)]
    pub allowed_plans: Vec<String>,
    /// Age bands a child must belong to; `None` means no age gating
    #[serde(default)]
    pub age_bands: Option<Vec<String>>,
    /// Flag gating the whole app
    #[serde(default)]
    pub feature_flag: Option<String>,
    #[serde(default)]
    pub dashboard_slots: Vec<DashboardSlot>,
    /// Analytics event names the app emits (informational)
    #[serde(default)]
    pub events: Vec<String>,
}

/// Acting user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub plan: Option<String>,
}

/// Acting child profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildContext {
    pub id: String,
    #[serde(default)]
    pub age_band: Option<String>,
}

/// Request-scoped input to a visibility query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisibilityContext {
    #[serde(default)]
    pub user: Option<UserContext>,
    #[serde(default)]
    pub child: Option<ChildContext>,
    /// Explicit flag overrides; fall back to the process-wide store
    #[serde(default)]
    pub flags: Option<HashMap<String, bool>>,
}

impl VisibilityContext {
    /// Plan of the acting user, `free` when unknown
    pub fn plan(&self) -> &str {
        self.user
            .as_ref()
            .and_then(|u| u.plan.as_deref())
            .unwrap_or(DEFAULT_PLAN)
    }

    /// Role of the acting user, if any
    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }
}

/// Whether `app` is visible in `ctx`.
///
/// All of these must hold:
/// 1. with a user present, the user's role is allowed
/// 2. the plan is entitled
/// 3. the feature flag, if any, resolves on
/// 4. for a child, the app allows children and the child's age band matches
///    the app's age bands (when the app declares any)
pub fn is_visible(app: &MicroAppDefinition, ctx: &VisibilityContext, flags: &FlagStore) -> bool {
    if let Some(role) = ctx.role() {
        if !app.allowed_roles.contains(&role) {
            return false;
        }
    }

    if !is_entitled(ctx.plan(), app) {
        return false;
    }

    if let Some(flag) = &app.feature_flag {
        if !flags.get_flag(flag, ctx.flags.as_ref()) {
            return false;
        }
    }

    if ctx.role() == Some(Role::Child) {
        if !app.allowed_roles.contains(&Role::Child) {
            return false;
        }
        return match &app.age_bands {
            None => true,
            Some(bands) => ctx
                .child
                .as_ref()
                .and_then(|c| c.age_band.as_ref())
                .is_some_and(|band| bands.contains(band)),
        };
    }

    true
}

/// Process-wide micro-app catalog
pub struct AppRegistry {
    apps: RwLock<Vec<MicroAppDefinition>>,
    flags: Arc<FlagStore>,
}

impl AppRegistry {
    /// Create an empty registry resolving flags against `flags`
    pub fn new(flags: Arc<FlagStore>) -> Self {
        Self {
            apps: RwLock::new(Vec::new()),
            flags,
        }
    }

    /// Flag store used for visibility queries
    pub fn flags(&self) -> &Arc<FlagStore> {
        &self.flags
    }

    /// Register an app.
    ///
    /// A second registration with an existing `id` is ignored. Returns whether
    /// the definition was inserted.
    pub fn register_app(&self, app: MicroAppDefinition) -> bool {
        let mut apps = self.apps.write().unwrap_or_else(PoisonError::into_inner);
        if apps.iter().any(|a| a.id == app.id) {
            debug!("App '{}' already registered, ignoring", app.id);
            return false;
        }
        info!("Registered micro-app '{}' at {}", app.id, app.route);
        apps.push(app);
        true
    }

    /// All registered apps in registration order
    pub fn get_apps(&self) -> Vec<MicroAppDefinition> {
        self.apps
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// App whose slug matches, if any
    pub fn get_app_by_slug(&self, slug: &str) -> Option<MicroAppDefinition> {
        self.apps
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|a| a.slug == slug)
            .cloned()
    }

    /// Apps visible in `ctx`, in registration order
    pub fn get_visible_apps(&self, ctx: &VisibilityContext) -> Vec<MicroAppDefinition> {
        self.apps
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|app| is_visible(app, ctx, &self.flags))
            .cloned()
            .collect()
    }

    /// Number of registered apps
    pub fn len(&self) -> usize {
        self.apps.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
