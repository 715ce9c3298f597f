use std::path::{Path, PathBuf};

use crate::config::schema::{Config, LogFormat};
use crate::error::{ConfigError, DumpError};

/// Overrides the backend base URL.
pub const ENV_BASE_URL: &str = "THEDUMP_BASE_URL";
/// Overrides the log filter.
pub const ENV_LOG_LEVEL: &str = "THEDUMP_LOG_LEVEL";
/// Overrides the log format (`text` or `json`).
pub const ENV_LOG_FORMAT: &str = "THEDUMP_LOG_FORMAT";

/// `<platform config dir>/thedump/config.json`, if the platform has one.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("thedump").join("config.json"))
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

/// Loads `path`, else the default config file if one exists, else the
/// built-in defaults, then applies environment overrides.
pub fn resolve_config(path: Option<&Path>) -> Result<Config, DumpError> {
    let path = path
        .map(Path::to_path_buf)
        .or_else(|| default_config_path().filter(|p| p.exists()));

    let config = match path {
        Some(path) => load_config(&path)?,
        None => Config::default(),
    };

    Ok(apply_env_overrides(config)?)
}

/// Applies `THEDUMP_*` environment overrides and re-validates.
pub fn apply_env_overrides(mut config: Config) -> Result<Config, ConfigError> {
    if let Some(url) = env_value(ENV_BASE_URL) {
        config.backend.base_url = url;
    }
    if let Some(level) = env_value(ENV_LOG_LEVEL) {
        config.logging.level = level;
    }
    if let Some(format) = env_value(ENV_LOG_FORMAT) {
        config.logging.format = format
            .parse::<LogFormat>()
            .map_err(|message| ConfigError::Validation { message })?;
    }

    validate_config(&config)?;

    Ok(config)
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    let backend = &config.backend;
    let url = reqwest::Url::parse(&backend.base_url).map_err(|e| ConfigError::InvalidUrl {
        url: backend.base_url.clone(),
        reason: e.to_string(),
    })?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl {
            url: backend.base_url.clone(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    for (name, path) in [
        ("upload_path", &backend.upload_path),
        ("status_path", &backend.status_path),
        ("usage_path", &backend.usage_path),
        ("counts_path", &backend.counts_path),
    ] {
        if !path.starts_with('/') {
            return Err(ConfigError::Validation {
                message: format!("backend.{} must start with '/': {}", name, path),
            });
        }
    }

    if backend.connect_timeout_secs == 0 || backend.request_timeout_secs == 0 {
        return Err(ConfigError::Validation {
            message: "backend timeouts must be greater than zero".to_string(),
        });
    }

    Ok(())
}
