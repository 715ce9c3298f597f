pub mod browse;
pub mod capture;
pub mod config;
pub mod error;
pub mod remote;
pub mod secrets;
pub mod session;
pub mod telemetry;
pub mod usage;

pub use browse::{BrowseIndex, FolderKind, FolderRow, NoteCounts};
pub use capture::{CaptureError, CaptureService};
pub use config::{load_config, resolve_config, Config};
pub use error::{ConfigError, DumpError, Result};
pub use remote::{
    ApiError, Credentials, FileStatusItem, HttpBackend, StatusService, UploadReceipt,
    UploadRequest, UploadTransport,
};
pub use secrets::{resolve_secret, SecretError, TokenSource};
pub use session::{SessionEvent, SessionItem, SessionItemKind, SessionStore, UploadStatus};
pub use usage::UsageStatus;
