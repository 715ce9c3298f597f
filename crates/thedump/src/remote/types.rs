//! Wire types exchanged with the organization backend.

use serde::{Deserialize, Serialize};

/// Body of the signed-upload request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUploadRequest {
    pub filename: String,
    pub content_type: String,
    pub is_quick_note: bool,
}

/// Response to the signed-upload request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Signed destination the bytes are PUT to.
    pub upload_url: String,
    pub storage_path: String,
    pub original_filename: String,
    pub metadata: UploadMetadata,
    /// Identifier used for status polling.
    pub uuid: String,
    pub is_quick_note: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadMetadata {
    pub user_email: String,
    pub upload_time: String,
    pub original_filename: String,
    pub file_extension: String,
    pub file_uuid: String,
    pub is_quick_note: String,
}

/// Error body returned by the backend on non-success responses.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileStatusRequest {
    pub file_uuids: Vec<String>,
}

/// Processing status of one uploaded file.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FileStatusItem {
    pub file_uuid: String,
    /// `completed`, `failed`, or anything else for "still pending".
    pub status: String,
    #[serde(default)]
    pub organized_note_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl FileStatusItem {
    /// Status entry reporting a completed organization.
    pub fn completed(
        file_uuid: &str,
        note_id: &str,
        title: Option<&str>,
        category: Option<&str>,
    ) -> Self {
        Self {
            file_uuid: file_uuid.to_string(),
            status: "completed".to_string(),
            organized_note_id: Some(note_id.to_string()),
            title: title.map(|s| s.to_string()),
            category_name: category.map(|s| s.to_string()),
            error: None,
        }
    }

    /// Status entry reporting a processing failure.
    pub fn failed(file_uuid: &str, error: Option<&str>) -> Self {
        Self {
            file_uuid: file_uuid.to_string(),
            status: "failed".to_string(),
            organized_note_id: None,
            title: None,
            category_name: None,
            error: error.map(|s| s.to_string()),
        }
    }

    /// Status entry for a file the backend is still working on.
    pub fn pending(file_uuid: &str) -> Self {
        Self {
            file_uuid: file_uuid.to_string(),
            status: "pending".to_string(),
            organized_note_id: None,
            title: None,
            category_name: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileStatusResponse {
    #[serde(default)]
    pub statuses: Vec<FileStatusItem>,
}
