//! Boundary to the organization backend.
//!
//! The session engine only depends on the two traits defined here:
//! [`StatusService`] for polling processing status and [`UploadTransport`]
//! for getting capture bytes to the backend. [`HttpBackend`] implements both
//! over HTTPS.

pub mod error;
pub mod http;
pub mod types;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

pub use error::ApiError;
pub use http::HttpBackend;
pub use types::{
    ApiErrorResponse, FileStatusItem, FileStatusRequest, FileStatusResponse, UploadMetadata,
    UploadResponse,
};

/// Signed-in user the uploads are attributed to.
#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub id_token: SecretString,
}

impl Credentials {
    pub fn new(email: impl Into<String>, id_token: SecretString) -> Self {
        Self {
            email: email.into(),
            id_token,
        }
    }
}

impl Clone for Credentials {
    fn clone(&self) -> Self {
        Self {
            email: self.email.clone(),
            id_token: SecretString::from(self.id_token.expose_secret().to_string()),
        }
    }
}

/// Bytes handed to the transport for one capture.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub filename: String,
}

/// What the transport reports back after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Identifier to poll processing status with.
    pub file_uuid: String,
    pub storage_path: String,
}

impl From<UploadResponse> for UploadReceipt {
    fn from(response: UploadResponse) -> Self {
        Self {
            file_uuid: response.uuid,
            storage_path: response.storage_path,
        }
    }
}

/// Reports the remote processing status of uploaded files.
#[async_trait]
pub trait StatusService: Send + Sync {
    /// Returns the current status for the given file identifiers. Files the
    /// backend does not know about may simply be absent from the result.
    async fn fetch_statuses(&self, file_uuids: &[String]) -> error::Result<Vec<FileStatusItem>>;
}

/// Moves capture bytes to backend storage.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    async fn upload(&self, request: UploadRequest) -> error::Result<UploadReceipt>;
}
