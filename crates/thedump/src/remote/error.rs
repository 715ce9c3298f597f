//! Backend communication error types.

use thiserror::Error;

use super::types::ApiErrorResponse;

/// Errors that can occur while talking to the organization backend.
#[derive(Error, Debug)]
pub enum ApiError {
    /// A configured or returned URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The payload could not be prepared for upload.
    #[error("Failed to encode upload payload: {0}")]
    EncodingFailed(String),

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Not authenticated: {message}")]
    Unauthorized { message: String },

    /// The account is not allowed to upload (e.g. usage limit reached).
    #[error("Upload not allowed: {message}")]
    Forbidden { message: String },

    #[error("File is too large: {message}")]
    PayloadTooLarge { message: String },

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Unexpected response ({status}): {message}")]
    UnexpectedStatus { status: u16, message: String },

    /// The PUT to the signed storage URL did not succeed.
    #[error("Storage upload failed with status {status}")]
    StorageUploadFailed { status: u16 },

    #[error("Failed to decode response: {0}")]
    DecodingFailed(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Local I/O failure while staging bytes for upload.
    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// Maps a non-success HTTP status and optional error body to an error.
    pub fn from_status(status: u16, body: Option<ApiErrorResponse>) -> Self {
        let message = body
            .map(|b| b.error)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| default_message(status).to_string());

        match status {
            400 => ApiError::BadRequest { message },
            401 => ApiError::Unauthorized { message },
            403 => ApiError::Forbidden { message },
            413 => ApiError::PayloadTooLarge { message },
            500..=599 => ApiError::Server { status, message },
            _ => ApiError::UnexpectedStatus { status, message },
        }
    }
}

fn default_message(status: u16) -> &'static str {
    match status {
        400 => "The request was rejected",
        401 => "Sign in again to continue",
        403 => "This account cannot upload right now",
        413 => "File exceeds the upload limit",
        500..=599 => "The server had a problem",
        _ => "Unexpected response from server",
    }
}

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_uses_body_message() {
        let err = ApiError::from_status(
            400,
            Some(ApiErrorResponse {
                error: "Missing filename".to_string(),
            }),
        );
        assert!(matches!(err, ApiError::BadRequest { ref message } if message == "Missing filename"));
        assert_eq!(err.to_string(), "Bad request: Missing filename");
    }

    #[test]
    fn test_from_status_defaults() {
        assert!(matches!(
            ApiError::from_status(401, None),
            ApiError::Unauthorized { .. }
        ));
        assert!(matches!(
            ApiError::from_status(403, None),
            ApiError::Forbidden { .. }
        ));
        assert!(matches!(
            ApiError::from_status(503, None),
            ApiError::Server { status: 503, .. }
        ));
        assert!(matches!(
            ApiError::from_status(418, None),
            ApiError::UnexpectedStatus { status: 418, .. }
        ));
    }

    #[test]
    fn test_blank_body_message_falls_back() {
        let err = ApiError::from_status(
            413,
            Some(ApiErrorResponse {
                error: "  ".to_string(),
            }),
        );
        assert_eq!(
            err.to_string(),
            "File is too large: File exceeds the upload limit"
        );
    }
}
