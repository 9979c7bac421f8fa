//! tikload library

pub mod advisor;
pub mod capability;
pub mod engine;
pub mod error;
pub mod models;
pub mod policy;
pub mod progress;

// Re-export main types for easier use
pub use capability::CapabilityState;
pub use engine::{DownloadOutcome, DownloadRequest, TransferEngine, DEFAULT_OUTPUT_DIR};
pub use error::TikloadError;
pub use models::VideoInfo;
pub use policy::{FormatPolicy, ImpersonationProfile, RequestIdentity};
pub use progress::{ProgressEvent, ProgressReporter};
