//! Error types for hearth-apps

use thiserror::Error;

/// Outcome of a failed app resolution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Unknown slug, or the caller is not allowed to see the app.
    /// The two cases are indistinguishable on purpose.
    #[error("App not found: {0}")]
    NotFound(String),

    /// Registered slug without an implementation module (deployment defect)
    #[error("App '{0}' is registered but has no implementation module")]
    UnmappedModule(String),
}
