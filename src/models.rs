//! Data structures for resolved video metadata

use serde::{Deserialize, Serialize};

/// Metadata resolved by yt-dlp for a single video.
///
/// Only the fields this tool reads; yt-dlp emits many more and they are
/// ignored during deserialization. Uploader and title arrive pre-sanitized
/// for filesystem use by the engine's output templating.
///
/// Note the dump also carries a top-level `url` (the selected media URL,
/// present whenever a single format was chosen) alongside `webpage_url`;
/// only the page URL is kept here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    pub webpage_url: String,
    pub uploader: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
}

impl VideoInfo {
    /// Uploader for path construction, defaulting when the extractor
    /// resolved none.
    pub fn uploader_or_unknown(&self) -> &str {
        self.uploader.as_deref().unwrap_or("unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_dump_json() {
        let json = r#"{
            "id": "7123456789012345678",
            "title": "my clip",
            "webpage_url": "https://www.tiktok.com/@user/video/7123456789012345678",
            "uploader": "user",
            "ext": "mp4",
            "duration": 14.5,
            "view_count": 1000
        }"#;
        let info: VideoInfo = serde_json::from_str(json).expect("parse");
        assert_eq!(info.id, "7123456789012345678");
        assert_eq!(info.uploader_or_unknown(), "user");
        assert_eq!(info.ext.as_deref(), Some("mp4"));
    }

    #[test]
    fn test_uploader_defaults_to_unknown() {
        let json =
            r#"{"id": "x", "title": "t", "webpage_url": "https://example.com", "uploader": null}"#;
        let info: VideoInfo = serde_json::from_str(json).expect("parse");
        assert_eq!(info.uploader_or_unknown(), "unknown");
    }

    #[test]
    fn test_deserialize_with_selected_media_url_alongside_page_url() {
        // A single-format selection adds a top-level media `url` next to
        // `webpage_url`; both keys must parse without a duplicate-field error.
        let json = r#"{
            "id": "7123456789012345678",
            "title": "my clip",
            "url": "https://v16-webapp.tiktok.com/video/tos/media.mp4?sig=abc",
            "webpage_url": "https://www.tiktok.com/@user/video/7123456789012345678",
            "uploader": "user",
            "ext": "mp4"
        }"#;
        let info: VideoInfo = serde_json::from_str(json).expect("parse");
        assert_eq!(
            info.webpage_url,
            "https://www.tiktok.com/@user/video/7123456789012345678"
        );
    }
}
