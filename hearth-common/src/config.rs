//! Bootstrap configuration loading and asset folder resolution
//!
//! Each service reads a small TOML file at startup. A missing file is not an
//! error: the service logs a warning and continues on compiled defaults.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Compiled defaults

use crate::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the audio asset folder
pub const ASSETS_ROOT_ENV: &str = "HEARTH_ASSETS_ROOT";

/// Bootstrap configuration loaded from TOML file
///
/// Cannot change while a service is running.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// HTTP server port (None = service default)
    #[serde(default)]
    pub port: Option<u16>,

    /// Folder holding audio assets (optional)
    #[serde(default)]
    pub assets_root: Option<PathBuf>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Initial process-wide feature flag values
    #[serde(default)]
    pub flags: HashMap<String, bool>,

    /// Soundscape playback defaults
    #[serde(default)]
    pub soundscape: SoundscapeSettings,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Soundscape playback defaults
#[derive(Debug, Clone, Deserialize)]
pub struct SoundscapeSettings {
    /// Master volume at startup (0.0-1.0)
    #[serde(default = "default_volume")]
    pub default_volume: f32,

    /// Fade-in applied when a mix is started without an explicit fade
    #[serde(default = "default_start_fade_in_ms")]
    pub start_fade_in_ms: u64,

    /// Fade-out used by `/soundscape/fade-out` when the request gives no
    /// duration. A plain stop without `fade_out_ms` does not fade.
    #[serde(default = "default_stop_fade_out_ms")]
    pub stop_fade_out_ms: u64,
}

impl Default for SoundscapeSettings {
    fn default() -> Self {
        Self {
            default_volume: default_volume(),
            start_fade_in_ms: default_start_fade_in_ms(),
            stop_fade_out_ms: default_stop_fade_out_ms(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_volume() -> f32 {
    0.8
}

fn default_start_fade_in_ms() -> u64 {
    1000
}

fn default_stop_fade_out_ms() -> u64 {
    1000
}

impl TomlConfig {
    /// Parse a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TomlConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the module's configuration, falling back to defaults when absent.
    ///
    /// A file that exists but fails to parse is still an error.
    pub fn load_or_default(module_name: &str, explicit: Option<&Path>) -> Result<Self> {
        match config_file_path(module_name, explicit) {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                Self::load(&path)
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using compiled defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                warn!("Could not determine config directory, using compiled defaults");
                Ok(Self::default())
            }
        }
    }

    fn validate(&self) -> Result<()> {
        let volume = self.soundscape.default_volume;
        if !(0.0..=1.0).contains(&volume) {
            return Err(Error::Config(format!(
                "soundscape.default_volume must be within 0.0-1.0, got {}",
                volume
            )));
        }
        Ok(())
    }
}

/// Configuration file location for a module.
///
/// An explicit path wins; otherwise `<config_dir>/hearth/<module>.toml`.
pub fn config_file_path(module_name: &str, explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    dirs::config_dir().map(|d| d.join("hearth").join(format!("{}.toml", module_name)))
}

/// Audio asset folder resolution
///
/// 1. Command-line argument (highest priority)
/// 2. `HEARTH_ASSETS_ROOT` environment variable
/// 3. TOML `assets_root`
/// 4. OS-dependent compiled default
pub fn resolve_assets_root(cli_arg: Option<&Path>, toml: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ASSETS_ROOT_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml.assets_root {
        return path.clone();
    }

    default_assets_root()
}

/// OS-dependent default asset folder
pub fn default_assets_root() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("hearth").join("assets"))
        .unwrap_or_else(|| PathBuf::from("./hearth_assets"))
}
