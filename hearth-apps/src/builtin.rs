//! Built-in micro-apps and their implementation modules
//!
//! Every registered slug must have an entry in [`AppModule::for_slug`]; a
//! slug without one is a deployment defect surfaced by the resolver.

use crate::entitlements::plans;
use crate::registry::{AppIcon, AppRegistry, DashboardSlot, MicroAppDefinition, Role};
use serde::Serialize;

/// Flag gating the soundscapes app
pub const SOUNDSCAPES_FLAG: &str = "apps.soundscapes.enabled";

/// Implementation module rendered for a resolved app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppModule {
    Soundscapes,
}

impl AppModule {
    /// Implementation for a slug, `None` when unmapped
    pub fn for_slug(slug: &str) -> Option<Self> {
        match slug {
            "soundscapes" => Some(AppModule::Soundscapes),
            _ => None,
        }
    }
}

/// Soundscapes app definition
pub fn soundscapes_app() -> MicroAppDefinition {
    MicroAppDefinition {
        id: "soundscapes".to_string(),
        slug: "soundscapes".to_string(),
        title: "Soundscapes".to_string(),
        icon: AppIcon::Renderable("rocket".to_string()),
        route: "/apps/soundscapes".to_string(),
        allowed_roles: vec![Role::Owner, Role::Caregiver, Role::Child],
        allowed_plans: vec![plans::PLUS.to_string(), plans::FAMILY.to_string()],
        age_bands: None,
        feature_flag: Some(SOUNDSCAPES_FLAG.to_string()),
        dashboard_slots: vec![DashboardSlot::Home, DashboardSlot::Kid],
        events: [
            "soundscape_started",
            "timer_set",
            "bedtime_mode_on",
            "soundscape_favorited",
            "soundscape_completed",
        ]
        .iter()
        .map(|e| e.to_string())
        .collect(),
    }
}

/// Register all built-in apps. Safe to call repeatedly.
pub fn register_builtin_apps(registry: &AppRegistry) {
    registry.register_app(soundscapes_app());
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_common::FlagStore;
    use std::sync::Arc;

    #[test]
    fn test_builtin_registration_is_repeatable() {
        let registry = AppRegistry::new(Arc::new(FlagStore::new()));
        register_builtin_apps(&registry);
        register_builtin_apps(&registry);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_every_builtin_slug_is_mapped() {
        let registry = AppRegistry::new(Arc::new(FlagStore::new()));
        register_builtin_apps(&registry);
        for app in registry.get_apps() {
            assert!(
                AppModule::for_slug(&app.slug).is_some(),
                "slug '{}' has no implementation module",
                app.slug
            );
        }
    }

    #[test]
    fn test_unknown_slug_unmapped() {
        assert_eq!(AppModule::for_slug("chores"), None);
    }
}
