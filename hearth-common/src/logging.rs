//! Tracing subscriber initialization shared by the service binaries

use crate::config::LoggingConfig;
use crate::Result;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the log filter.
///
/// `RUST_LOG` wins; otherwise `<crate>=<level>` from the TOML logging level,
/// or the level verbatim if it already is a directive list.
pub fn build_filter(crate_name: &str, logging: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = logging.level.trim();
        let directive = if level.contains('=') || level.contains(',') {
            level.to_string()
        } else {
            format!("{}={},hearth_common={},tower_http=info", crate_name, level, level)
        };
        EnvFilter::new(directive)
    })
}

/// Install the global tracing subscriber
///
/// Logs go to stderr unless `logging.file` is set, in which case they are
/// appended to that file.
pub fn init_tracing(crate_name: &str, logging: &LoggingConfig) -> Result<()> {
    let filter = build_filter(crate_name, logging);

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .try_init()
                .map_err(|e| crate::Error::Internal(format!("Failed to init tracing: {}", e)))?;
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .try_init()
                .map_err(|e| crate::Error::Internal(format!("Failed to init tracing: {}", e)))?;
        }
    }

    Ok(())
}
