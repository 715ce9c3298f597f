//! Resolution of the sign-in token used for backend requests.
//!
//! The ID token is looked up in priority order:
//!
//! 1. **Direct value** - passed on the command line
//! 2. **File reference** - a file holding the token (trailing whitespace trimmed)
//! 3. **Env var reference** - defaults to `THEDUMP_ID_TOKEN`

use secrecy::SecretString;
use std::fs;

/// Environment variable consulted when no other token source is given.
pub const ID_TOKEN_ENV_VAR: &str = "THEDUMP_ID_TOKEN";

/// Error type for secret resolution failures.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No token source provided (need one of: direct value, file path, or env var name)")]
    NoSourceProvided,

    #[error("Failed to read token from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },

    #[error("Token from {origin} is empty")]
    Empty { origin: String },
}

/// Result type for secret resolution.
pub type Result<T> = std::result::Result<T, SecretError>;

/// Where to look for the ID token.
#[derive(Debug, Clone, Default)]
pub struct TokenSource {
    pub direct: Option<String>,
    pub file_path: Option<String>,
    pub env_var: Option<String>,
}

impl TokenSource {
    /// Resolves the token, falling back to [`ID_TOKEN_ENV_VAR`] when no
    /// env var name was configured.
    pub fn resolve(&self) -> Result<SecretString> {
        let env_var = self.env_var.as_deref().unwrap_or(ID_TOKEN_ENV_VAR);
        resolve_secret(
            self.direct.as_deref(),
            self.file_path.as_deref(),
            Some(env_var),
        )
    }
}

/// Resolves a secret from a direct value, a file, or an environment variable,
/// in that order. Empty sources are skipped.
pub fn resolve_secret(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> Result<SecretString> {
    if let Some(value) = direct.filter(|v| !v.is_empty()) {
        return Ok(SecretString::from(value.to_string()));
    }

    if let Some(path) = file_path.filter(|p| !p.is_empty()) {
        let expanded = expand_home(path);
        let content = fs::read_to_string(&expanded).map_err(|e| SecretError::FileReadError {
            path: expanded.clone(),
            source: e,
        })?;
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(SecretError::Empty { origin: expanded });
        }
        return Ok(SecretString::from(trimmed.to_string()));
    }

    if let Some(var_name) = env_var.filter(|n| !n.is_empty()) {
        return match std::env::var(var_name) {
            // Env vars may carry trailing newlines
            Ok(value) => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(SecretError::Empty {
                        origin: format!("environment variable '{}'", var_name),
                    });
                }
                Ok(SecretString::from(trimmed.to_string()))
            }
            Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                name: var_name.to_string(),
            }),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                name: var_name.to_string(),
            }),
        };
    }

    Err(SecretError::NoSourceProvided)
}

/// Expands a leading `~` to the current user's home directory.
fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            if path == "~" {
                return home.to_string_lossy().into_owned();
            }
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
