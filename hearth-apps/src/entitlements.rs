//! Plan entitlement checks

use crate::registry::MicroAppDefinition;

/// Plan assumed when the caller's plan is unknown
pub const DEFAULT_PLAN: &str = "free";

/// Well-known plan keys
pub mod plans {
    pub const FREE: &str = "free";
    pub const PLUS: &str = "plus";
    pub const FAMILY: &str = "family";
}

/// Whether `plan` grants access to `app`.
///
/// Apps without plan restrictions are open to every plan.
pub fn is_entitled(plan: &str, app: &MicroAppDefinition) -> bool {
    app.allowed_plans.is_empty() || app.allowed_plans.iter().any(|p| p == plan)
}

/// Upgrade prompt for a plan that is not entitled to `app`
pub fn upsell_copy(app: &MicroAppDefinition, plan: &str) -> Option<String> {
    if is_entitled(plan, app) {
        return None;
    }
    Some(format!(
        "This feature requires a {} plan.",
        app.allowed_plans.join(", ")
    ))
}
