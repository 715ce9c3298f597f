//! Capture flows: stage a capture in the session, upload it, hand it to polling.

use std::path::Path;
use std::sync::Arc;

use log::{info, warn};
use thiserror::Error;

use crate::remote::{ApiError, UploadRequest, UploadTransport};
use crate::session::{SessionItem, SessionItemKind, SessionStore};

/// Largest voice memo accepted for upload.
pub const MAX_AUDIO_BYTES: u64 = 100 * 1024 * 1024;

const PHOTO_CONTENT_TYPE: &str = "image/jpeg";
const AUDIO_CONTENT_TYPE: &str = "audio/m4a";
const TEXT_CONTENT_TYPE: &str = "text/plain";
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Errors raised before a capture is added to the session.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Note is empty")]
    EmptyText,

    #[error("Photo has no image data")]
    EmptyPhoto,

    #[error("Path has no file name: {0}")]
    NoFileName(String),
}

/// Runs captures against a session store and an upload transport.
#[derive(Clone)]
pub struct CaptureService {
    store: SessionStore,
    transport: Arc<dyn UploadTransport>,
}

impl CaptureService {
    pub fn new(store: SessionStore, transport: Arc<dyn UploadTransport>) -> Self {
        Self { store, transport }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Uploads a typed note. Blank notes are rejected without touching the session.
    pub async fn capture_text(&self, content: &str) -> Result<String, CaptureError> {
        if content.trim().is_empty() {
            return Err(CaptureError::EmptyText);
        }

        let filename = format!("note_{}.txt", short_id());
        let item = SessionItem::new(SessionItemKind::Text, filename.clone());
        let id = self.stage(item);

        let request = UploadRequest {
            bytes: content.as_bytes().to_vec(),
            content_type: TEXT_CONTENT_TYPE.to_string(),
            filename,
        };
        self.submit(&id, Ok(request)).await;
        Ok(id)
    }

    /// Uploads a JPEG photo, keeping an optional thumbnail for display.
    pub async fn capture_photo(
        &self,
        jpeg: Vec<u8>,
        thumbnail: Option<Vec<u8>>,
    ) -> Result<String, CaptureError> {
        if jpeg.is_empty() {
            return Err(CaptureError::EmptyPhoto);
        }

        let filename = generate_filename("photo", "jpg");
        let mut item = SessionItem::new(SessionItemKind::Photo, filename.clone());
        if let Some(thumbnail) = thumbnail {
            item = item.with_thumbnail(thumbnail);
        }
        let id = self.stage(item);

        let request = UploadRequest {
            bytes: jpeg,
            content_type: PHOTO_CONTENT_TYPE.to_string(),
            filename,
        };
        self.submit(&id, Ok(request)).await;
        Ok(id)
    }

    /// Uploads a recorded voice memo from its staged file.
    pub async fn capture_audio(&self, path: &Path) -> Result<String, CaptureError> {
        let filename = generate_filename("voice", "m4a");
        let item = SessionItem::new(SessionItemKind::Audio, filename.clone()).with_local_file(path);
        let id = self.stage(item);

        let request = read_staged(path, Some(MAX_AUDIO_BYTES))
            .await
            .map(|bytes| UploadRequest {
                bytes,
                content_type: AUDIO_CONTENT_TYPE.to_string(),
                filename,
            });
        self.submit(&id, request).await;
        Ok(id)
    }

    /// Uploads an arbitrary file under its own name.
    pub async fn capture_file(&self, path: &Path) -> Result<String, CaptureError> {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| CaptureError::NoFileName(path.display().to_string()))?;

        let item = SessionItem::new(SessionItemKind::File, filename.clone()).with_local_file(path);
        let id = self.stage(item);

        let content_type = mime_guess::from_path(path)
            .first()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());

        let request = read_staged(path, None).await.map(|bytes| UploadRequest {
            bytes,
            content_type,
            filename,
        });
        self.submit(&id, request).await;
        Ok(id)
    }

    /// Adds the item to the session and moves it straight to `uploading`.
    fn stage(&self, item: SessionItem) -> String {
        let id = item.id.clone();
        self.store.add_item(item);
        self.store.mark_uploading(&id);
        id
    }

    async fn submit(&self, id: &str, request: Result<UploadRequest, ApiError>) {
        let outcome = match request {
            Ok(request) => self.transport.upload(request).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(receipt) => {
                info!("Item {} uploaded as {}", id, receipt.file_uuid);
                self.store.mark_processing(id, &receipt.file_uuid);
            }
            Err(e) => {
                warn!("Upload of item {} failed: {}", id, e);
                self.store.mark_failed(id, &user_message(&e));
            }
        }
    }
}

/// Message shown on the failed item.
fn user_message(err: &ApiError) -> String {
    match err {
        ApiError::BadRequest { message }
        | ApiError::Unauthorized { message }
        | ApiError::Forbidden { message }
        | ApiError::PayloadTooLarge { message } => message.clone(),
        other => other.to_string(),
    }
}

async fn read_staged(path: &Path, max_bytes: Option<u64>) -> Result<Vec<u8>, ApiError> {
    let read_error = |source| ApiError::ReadFile {
        path: path.display().to_string(),
        source,
    };

    if let Some(max) = max_bytes {
        let metadata = tokio::fs::metadata(path).await.map_err(read_error)?;
        if metadata.len() > max {
            return Err(ApiError::PayloadTooLarge {
                message: "File exceeds 100MB limit".to_string(),
            });
        }
    }

    tokio::fs::read(path).await.map_err(read_error)
}

fn generate_filename(kind: &str, extension: &str) -> String {
    format!(
        "{}_{}.{}",
        kind,
        uuid::Uuid::new_v4().to_string().to_lowercase(),
        extension
    )
}

fn short_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}
