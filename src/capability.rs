//! Environment capability probing
//!
//! Everything here answers one question about the host and never fails:
//! absence of an optional tool is a valid, common outcome. Detection runs
//! once per download attempt and the results are carried as plain values.

use crate::policy::ImpersonationProfile;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Snapshot of local tooling, taken once at the start of a download attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityState {
    /// True when ffmpeg is resolvable, enabling separate-stream merge/remux.
    pub remux_available: bool,
}

impl CapabilityState {
    pub fn detect() -> Self {
        Self {
            remux_available: probe_remux_capability(),
        }
    }
}

/// Well-known ffmpeg install locations checked after PATH.
const FFMPEG_FALLBACK_PATHS: &[&str] = &[
    // macOS Homebrew (Apple Silicon)
    "/opt/homebrew/bin/ffmpeg",
    // macOS Homebrew (Intel) / Linux local
    "/usr/local/bin/ffmpeg",
    // System
    "/usr/bin/ffmpeg",
    // User local
    "~/.local/bin/ffmpeg",
    // Windows manual installs
    r"C:\ffmpeg\bin\ffmpeg.exe",
    r"C:\Program Files\ffmpeg\bin\ffmpeg.exe",
];

/// Return true if ffmpeg is on the PATH or in a common install location.
pub fn probe_remux_capability() -> bool {
    if let Ok(path) = which::which("ffmpeg") {
        info!("ffmpeg found on PATH: {}", path.display());
        return true;
    }

    for candidate in FFMPEG_FALLBACK_PATHS {
        let expanded = expand_home(candidate);
        if expanded.exists() && is_executable(&expanded) {
            info!("ffmpeg found at: {}", expanded.display());
            return true;
        }
    }

    debug!("ffmpeg not found; falling back to pre-muxed formats");
    false
}

/// Well-known yt-dlp install locations checked after PATH.
///
/// Covers launch environments where PATH lacks user-installed Python
/// binaries (Finder/Dock on macOS, minimal cron shells).
const YTDLP_FALLBACK_PATHS: &[&str] = &[
    "/opt/homebrew/bin/yt-dlp",
    "/usr/local/bin/yt-dlp",
    "/usr/bin/yt-dlp",
    "/Library/Frameworks/Python.framework/Versions/3.12/bin/yt-dlp",
    "/Library/Frameworks/Python.framework/Versions/3.11/bin/yt-dlp",
    "~/.local/bin/yt-dlp",
];

/// Find the yt-dlp binary with priority:
/// 1. System PATH
/// 2. Common installation paths
pub fn find_ytdlp() -> Option<PathBuf> {
    if let Ok(path) = which::which("yt-dlp") {
        if path.exists() {
            info!("Using system yt-dlp: {}", path.display());
            return Some(path);
        }
    }

    for candidate in YTDLP_FALLBACK_PATHS {
        let expanded = expand_home(candidate);
        if expanded.exists() && is_executable(&expanded) {
            info!("Using yt-dlp from common path: {}", expanded.display());
            return Some(expanded);
        }
    }

    warn!("yt-dlp not found anywhere");
    None
}

/// Ask the engine whether client impersonation is usable.
///
/// yt-dlp only supports `--impersonate` when built with curl_cffi; probing
/// is done by listing targets. Any failure here (engine too old for the
/// flag, no targets compiled in, spawn error) degrades to `None` and
/// must never abort the overall operation.
pub async fn probe_impersonation(ytdlp_path: &Path) -> Option<ImpersonationProfile> {
    let output = tokio::process::Command::new(ytdlp_path)
        .arg("--list-impersonate-targets")
        .output()
        .await
        .ok()?;

    if !output.status.success() {
        debug!("impersonation probe failed; proceeding without");
        return None;
    }

    let listing = String::from_utf8_lossy(&output.stdout);
    if listing.to_lowercase().contains("chrome") {
        let profile = ImpersonationProfile::chrome();
        info!("Client impersonation enabled ({})", profile.target());
        Some(profile)
    } else {
        debug!("no chrome impersonation target available");
        None
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Check if a file is executable
fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        if let Ok(metadata) = std::fs::metadata(path) {
            return metadata.permissions().mode() & 0o111 != 0;
        }
        false
    }

    #[cfg(not(unix))]
    {
        path.exists()
    }
}
