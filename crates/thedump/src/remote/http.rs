//! HTTPS client for the organization backend.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, Response};
use secrecy::ExposeSecret;

use super::error::{ApiError, Result};
use super::types::{
    ApiErrorResponse, FileStatusItem, FileStatusRequest, FileStatusResponse, SignedUploadRequest,
    UploadResponse,
};
use super::{Credentials, StatusService, UploadReceipt, UploadRequest, UploadTransport};
use crate::browse::NoteCounts;
use crate::config::BackendConfig;
use crate::error::DumpError;
use crate::secrets::TokenSource;
use crate::usage::UsageStatus;

/// Client for the upload, status, usage and counts endpoints.
pub struct HttpBackend {
    client: Client,
    config: BackendConfig,
    credentials: Credentials,
}

/// Creates an HTTP client with a connect timeout only. Request timeouts are
/// applied per call so that status polling stays unbounded.
fn create_http_client(config: &BackendConfig) -> Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .build()
        .map_err(ApiError::Network)
}

impl HttpBackend {
    pub fn new(config: BackendConfig, credentials: Credentials) -> Result<Self> {
        Ok(Self {
            client: create_http_client(&config)?,
            config,
            credentials,
        })
    }

    /// Resolves the ID token from `tokens` and builds the client.
    pub fn from_sources(
        config: BackendConfig,
        email: impl Into<String>,
        tokens: &TokenSource,
    ) -> std::result::Result<Self, DumpError> {
        let id_token = tokens.resolve()?;
        Ok(Self::new(config, Credentials::new(email, id_token))?)
    }

    fn endpoint(&self, path: &str) -> Result<reqwest::Url> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        reqwest::Url::parse(&url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", url, e)))
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config.request_timeout_secs)
    }

    /// Step 1: ask the backend for a signed storage destination.
    async fn request_signed_url(&self, filename: &str, content_type: &str) -> Result<UploadResponse> {
        let url = self.endpoint(&self.config.upload_path)?;
        let body = SignedUploadRequest {
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            is_quick_note: false,
        };

        debug!("Requesting signed upload URL for {} ({})", filename, content_type);

        let response = self
            .client
            .post(url)
            .bearer_auth(self.credentials.id_token.expose_secret())
            .json(&body)
            .timeout(self.request_timeout())
            .send()
            .await?;

        // The signed-URL endpoint answers exactly 200 on success.
        if response.status().as_u16() != 200 {
            return Err(error_from_response(response).await);
        }

        response
            .json::<UploadResponse>()
            .await
            .map_err(|e| ApiError::DecodingFailed(e.to_string()))
    }

    /// Step 2: PUT the bytes to the signed destination.
    async fn upload_to_storage(&self, upload_url: &str, request: UploadRequest) -> Result<()> {
        let url = reqwest::Url::parse(upload_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", upload_url, e)))?;

        let response = self
            .client
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, request.content_type)
            .body(request.bytes)
            .timeout(self.request_timeout())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::StorageUploadFailed {
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }

    /// Fetches the signed-in user's plan usage.
    pub async fn fetch_usage_status(&self) -> Result<UsageStatus> {
        let url = self.endpoint(&self.config.usage_path)?;

        let response = self
            .client
            .get(url)
            .bearer_auth(self.credentials.id_token.expose_secret())
            .timeout(self.request_timeout())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        response
            .json::<UsageStatus>()
            .await
            .map_err(|e| ApiError::DecodingFailed(e.to_string()))
    }

    /// Fetches note counts per category, date group and file type.
    pub async fn fetch_counts(&self) -> Result<NoteCounts> {
        let url = self.endpoint(&self.config.counts_path)?;

        let response = self
            .client
            .get(url)
            .bearer_auth(self.credentials.id_token.expose_secret())
            .timeout(self.request_timeout())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        response
            .json::<NoteCounts>()
            .await
            .map_err(|e| ApiError::DecodingFailed(e.to_string()))
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

async fn error_from_response(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let body = response
        .bytes()
        .await
        .ok()
        .and_then(|bytes| serde_json::from_slice::<ApiErrorResponse>(&bytes).ok());
    ApiError::from_status(status, body)
}

#[async_trait]
impl UploadTransport for HttpBackend {
    async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt> {
        let signed = self
            .request_signed_url(&request.filename, &request.content_type)
            .await?;

        let upload_url = signed.upload_url.clone();
        let size = request.bytes.len();
        self.upload_to_storage(&upload_url, request).await?;

        info!(
            "Uploaded {} ({} bytes) for {} as {}",
            signed.original_filename, size, self.credentials.email, signed.uuid
        );

        Ok(signed.into())
    }
}

#[async_trait]
impl StatusService for HttpBackend {
    async fn fetch_statuses(&self, file_uuids: &[String]) -> Result<Vec<FileStatusItem>> {
        let url = self.endpoint(&self.config.status_path)?;
        let body = FileStatusRequest {
            file_uuids: file_uuids.to_vec(),
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(self.credentials.id_token.expose_secret())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = error_from_response(response).await;
            warn!("Status request failed: {}", err);
            return Err(err);
        }

        let parsed: FileStatusResponse = response
            .json()
            .await
            .map_err(|e| ApiError::DecodingFailed(e.to_string()))?;

        Ok(parsed.statuses)
    }
}
