//! Feature flag store
//!
//! Process-wide flag state shared by reference between the services'
//! components. Read-frequently, write-rarely access pattern using RwLock.
//!
//! Request-scoped overrides always win over the stored value; unknown flags
//! resolve to `false`.
//!
//! # Usage
//!
//! ```rust
//! use hearth_common::FlagStore;
//! use std::collections::HashMap;
//!
//! let flags = FlagStore::new();
//! flags.expose_flag("apps.soundscapes.enabled", true);
//! assert!(flags.get_flag("apps.soundscapes.enabled", None));
//!
//! let overrides = HashMap::from([("apps.soundscapes.enabled".to_string(), false)]);
//! assert!(!flags.get_flag("apps.soundscapes.enabled", Some(&overrides)));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// Process-wide feature flag values
#[derive(Debug, Default)]
pub struct FlagStore {
    values: RwLock<HashMap<String, bool>>,
}

impl FlagStore {
    /// Create an empty store (every flag off)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded from configuration
    pub fn from_map(values: HashMap<String, bool>) -> Self {
        Self {
            values: RwLock::new(values),
        }
    }

    /// Resolve a flag.
    ///
    /// An entry in `overrides` wins; otherwise the process-wide value is used;
    /// otherwise the flag is off.
    pub fn get_flag(&self, name: &str, overrides: Option<&HashMap<String, bool>>) -> bool {
        if let Some(value) = overrides.and_then(|o| o.get(name)) {
            return *value;
        }
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()
            .unwrap_or(false)
    }

    /// Set a flag's process-wide value
    pub fn expose_flag(&self, name: &str, value: bool) {
        debug!("Exposing flag {} = {}", name, value);
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), value);
    }

    /// Sorted copy of all process-wide values
    pub fn snapshot(&self) -> BTreeMap<String, bool> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }
}
