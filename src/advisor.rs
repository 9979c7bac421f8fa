//! Static operator guidance for failed transfers
//!
//! Not a diagnostic engine: the checklist is fixed and ordered, covering the
//! failure causes seen in practice for bot-protected video hosts.

const REMEDIATION_HINTS: [&str; 6] = [
    "Make sure the video is public.",
    "Update yt-dlp          →  pip install -U yt-dlp",
    "Install curl_cffi      →  pip install curl_cffi (enables impersonation)",
    "Install ffmpeg for mp4 →  https://ffmpeg.org/download.html",
    "Try with browser cookies (yt-dlp --cookies-from-browser chrome).",
    "Some regions require a VPN.",
];

/// The fixed remediation checklist, in presentation order.
pub fn advise() -> &'static [&'static str] {
    &REMEDIATION_HINTS
}
