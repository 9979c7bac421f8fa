//! Error handling for tikload

use thiserror::Error;

/// Main error type for tikload
#[derive(Debug, Error)]
pub enum TikloadError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("yt-dlp not found. Please install yt-dlp (pip install yt-dlp / brew install yt-dlp)")]
    EngineNotFound,

    #[error("Failed to extract video info: {0}")]
    ExtractionError(String),

    #[error("Download failed: {0}")]
    DownloadError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
