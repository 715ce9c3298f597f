//! Capture session: per-item lifecycle, the session list, and change events.

pub mod events;
pub mod item;
pub mod store;

pub use events::{SessionEvent, SessionEventBroadcaster};
pub use item::{SessionItem, SessionItemKind, UploadStatus};
pub use store::{SessionStore, AUTO_REMOVE_DELAY, DEFAULT_PROCESSING_ERROR, POLL_INTERVAL};
