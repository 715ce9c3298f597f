//! Logging setup.
//!
//! Library code logs through the `log` facade; this installs a
//! `tracing-subscriber` registry and forwards `log` records into it.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use crate::config::{LogFormat, LoggingConfig};
use crate::error::DumpError;

/// Builds the env filter: `RUST_LOG` if set, otherwise the configured level.
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), DumpError> {
    let registry = Registry::default().with(env_filter(config));

    let result = match config.format {
        LogFormat::Json => {
            tracing::subscriber::set_global_default(registry.with(fmt::layer().json()))
        }
        LogFormat::Text => tracing::subscriber::set_global_default(registry.with(fmt::layer())),
    };
    result.map_err(|e| DumpError::Logging(e.to_string()))?;

    tracing_log::LogTracer::init().map_err(|e| DumpError::Logging(e.to_string()))?;

    log::debug!(
        "Logging initialized (level: {}, format: {:?})",
        config.level,
        config.format
    );
    Ok(())
}
