//! Capture lifecycle record and its status variants.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

/// What the user captured.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SessionItemKind {
    Photo,
    Audio,
    File,
    Text,
}

impl std::fmt::Display for SessionItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionItemKind::Photo => write!(f, "photo"),
            SessionItemKind::Audio => write!(f, "audio"),
            SessionItemKind::File => write!(f, "file"),
            SessionItemKind::Text => write!(f, "text"),
        }
    }
}

/// Lifecycle state of a capture.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UploadStatus {
    /// Created, not yet submitted.
    Pending,
    /// Byte transfer in flight.
    Uploading,
    /// Transport succeeded; waiting for the backend to organize the capture.
    Processing,
    /// Organized into a note. Terminal.
    Processed {
        note_id: String,
        title: Option<String>,
        category: Option<String>,
    },
    /// Terminal failure with a human-readable message.
    Failed { error: String },
}

impl UploadStatus {
    /// Text shown next to the item in the session list.
    pub fn display_text(&self) -> String {
        match self {
            UploadStatus::Pending => "Pending…".to_string(),
            UploadStatus::Uploading => "Uploading…".to_string(),
            UploadStatus::Processing => "Processing…".to_string(),
            UploadStatus::Processed { category, .. } => match category.as_deref() {
                Some(category) if !category.is_empty() => format!("Organized → {}", category),
                _ => "Organized".to_string(),
            },
            UploadStatus::Failed { error } => format!("Failed: {}", error),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, UploadStatus::Failed { .. })
    }

    /// True for `processed` and `failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UploadStatus::Processed { .. } | UploadStatus::Failed { .. }
        )
    }

    pub fn is_processing(&self) -> bool {
        matches!(self, UploadStatus::Processing)
    }

    /// Position in the forward-only lifecycle. Both terminal states share a rank.
    fn rank(&self) -> u8 {
        match self {
            UploadStatus::Pending => 0,
            UploadStatus::Uploading => 1,
            UploadStatus::Processing => 2,
            UploadStatus::Processed { .. } | UploadStatus::Failed { .. } => 3,
        }
    }

    /// Whether moving from `self` to `next` goes strictly forward.
    pub fn can_advance_to(&self, next: &UploadStatus) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

impl std::fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_text())
    }
}

/// One capture awaiting or undergoing organization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionItem {
    /// Locally generated identifier, never reused.
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub kind: SessionItemKind,
    pub original_filename: String,
    /// Staged byte source for audio and file captures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_file: Option<PathBuf>,
    status: UploadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_uuid: Option<String>,
}

impl SessionItem {
    /// Creates a pending item with a fresh id and the current timestamp.
    pub fn new(kind: SessionItemKind, original_filename: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            kind,
            original_filename: original_filename.into(),
            local_file: None,
            status: UploadStatus::Pending,
            thumbnail: None,
            file_uuid: None,
        }
    }

    /// Overrides the generated id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_local_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_file = Some(path.into());
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: Vec<u8>) -> Self {
        self.thumbnail = Some(thumbnail);
        self
    }

    pub fn status(&self) -> &UploadStatus {
        &self.status
    }

    /// Remote identifier assigned when the item entered `processing`.
    pub fn file_uuid(&self) -> Option<&str> {
        self.file_uuid.as_deref()
    }

    /// Applies a forward transition. Entering `processing` is only possible
    /// through [`SessionItem::begin_processing`]. Returns whether the status changed.
    pub fn advance(&mut self, next: UploadStatus) -> bool {
        if next.is_processing() || !self.status.can_advance_to(&next) {
            debug!(
                "Ignoring transition of item {} from {:?} to {:?}",
                self.id, self.status, next
            );
            return false;
        }
        self.status = next;
        true
    }

    /// Moves the item into `processing` and records its remote identifier.
    /// Returns whether the transition happened.
    pub fn begin_processing(&mut self, file_uuid: impl Into<String>) -> bool {
        if self.file_uuid.is_some() || !self.status.can_advance_to(&UploadStatus::Processing) {
            debug!(
                "Ignoring processing transition of item {} in state {:?}",
                self.id, self.status
            );
            return false;
        }
        self.file_uuid = Some(file_uuid.into());
        self.status = UploadStatus::Processing;
        // The staged bytes are no longer needed once the backend has them.
        self.local_file = None;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processed(category: Option<&str>) -> UploadStatus {
        UploadStatus::Processed {
            note_id: "n1".to_string(),
            title: Some("Grocery list".to_string()),
            category: category.map(|c| c.to_string()),
        }
    }

    #[test]
    fn test_display_text() {
        assert_eq!(UploadStatus::Pending.display_text(), "Pending…");
        assert_eq!(UploadStatus::Uploading.display_text(), "Uploading…");
        assert_eq!(UploadStatus::Processing.display_text(), "Processing…");
        assert_eq!(
            processed(Some("Shopping")).display_text(),
            "Organized → Shopping"
        );
        assert_eq!(processed(Some("")).display_text(), "Organized");
        assert_eq!(processed(None).display_text(), "Organized");
        assert_eq!(
            UploadStatus::Failed {
                error: "OCR timeout".to_string()
            }
            .display_text(),
            "Failed: OCR timeout"
        );
    }

    #[test]
    fn test_display_matches_display_text() {
        let status = processed(Some("Work"));
        assert_eq!(status.to_string(), status.display_text());
    }

    #[test]
    fn test_only_failed_is_retryable() {
        assert!(!UploadStatus::Pending.is_retryable());
        assert!(!UploadStatus::Uploading.is_retryable());
        assert!(!UploadStatus::Processing.is_retryable());
        assert!(!processed(Some("Shopping")).is_retryable());
        assert!(UploadStatus::Failed {
            error: "boom".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_new_item_defaults() {
        let item = SessionItem::new(SessionItemKind::Text, "note.txt");
        assert_eq!(item.status(), &UploadStatus::Pending);
        assert!(item.file_uuid().is_none());
        assert!(item.thumbnail.is_none());
        assert!(!item.id.is_empty());

        let other = SessionItem::new(SessionItemKind::Text, "note.txt");
        assert_ne!(item.id, other.id);
    }

    #[test]
    fn test_forward_transitions() {
        let mut item = SessionItem::new(SessionItemKind::Photo, "photo.jpg");
        assert!(item.advance(UploadStatus::Uploading));
        assert!(item.begin_processing("uuid-1"));
        assert_eq!(item.file_uuid(), Some("uuid-1"));
        assert!(item.advance(processed(Some("Receipts"))));
        assert_eq!(item.file_uuid(), Some("uuid-1"));
    }

    #[test]
    fn test_backward_transitions_rejected() {
        let mut item = SessionItem::new(SessionItemKind::Photo, "photo.jpg");
        item.advance(UploadStatus::Uploading);
        assert!(!item.advance(UploadStatus::Pending));
        assert!(!item.advance(UploadStatus::Uploading));
        assert_eq!(item.status(), &UploadStatus::Uploading);

        item.begin_processing("uuid-1");
        item.advance(processed(None));
        assert!(!item.advance(UploadStatus::Failed {
            error: "late".to_string()
        }));
        assert!(!item.begin_processing("uuid-2"));
        assert_eq!(item.file_uuid(), Some("uuid-1"));
    }

    #[test]
    fn test_processing_requires_file_uuid() {
        let mut item = SessionItem::new(SessionItemKind::Text, "note.txt");
        assert!(!item.advance(UploadStatus::Processing));
        assert_eq!(item.status(), &UploadStatus::Pending);
        assert!(item.file_uuid().is_none());
    }

    #[test]
    fn test_transport_failure_keeps_file_uuid_unset() {
        let mut item = SessionItem::new(SessionItemKind::Audio, "voice.m4a");
        item.advance(UploadStatus::Uploading);
        assert!(item.advance(UploadStatus::Failed {
            error: "network down".to_string()
        }));
        assert!(item.file_uuid().is_none());
    }

    #[test]
    fn test_begin_processing_drops_local_file() {
        let mut item =
            SessionItem::new(SessionItemKind::File, "scan.pdf").with_local_file("/tmp/scan.pdf");
        item.advance(UploadStatus::Uploading);
        item.begin_processing("uuid-9");
        assert!(item.local_file.is_none());
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        let json = serde_json::to_string(&SessionItemKind::Audio).unwrap();
        assert_eq!(json, "\"audio\"");
    }
}
