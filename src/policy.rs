//! Format-selection policy and outbound request identity
//!
//! Both are derived deterministically from probed capability state and fixed
//! for the lifetime of one invocation. The format fallback chains are a
//! fixed policy, not runtime configuration: prefer the highest quality
//! achievable with local tooling, degrade gracefully.

use crate::capability::CapabilityState;

/// Target container for all saved files.
pub const TARGET_CONTAINER: &str = "mp4";

/// Post-processing step applied by the engine after transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostProcessor {
    pub kind: PostProcessorKind,
    pub target_container: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostProcessorKind {
    /// Repackage streams into the target container without re-encoding.
    Convert,
}

/// Ordered format fallback chain plus post-processing pipeline.
///
/// Invariant: `postprocessors` is non-empty only for the remux-capable
/// variant, since merging separate streams requires ffmpeg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatPolicy {
    pub tiers: Vec<String>,
    pub postprocessors: Vec<PostProcessor>,
}

impl FormatPolicy {
    /// Render the chain as a single yt-dlp format selector.
    pub fn selector(&self) -> String {
        self.tiers.join("/")
    }
}

/// Derive the format policy from local capability.
///
/// Remux-capable hosts fetch the best separate video+audio streams and merge
/// them; without ffmpeg only pre-muxed single streams are requested.
pub fn build_policy(capability: &CapabilityState) -> FormatPolicy {
    if capability.remux_available {
        FormatPolicy {
            tiers: vec![
                "bestvideo[ext=mp4]+bestaudio[ext=m4a]".to_string(),
                "bestvideo[ext=mp4]+bestaudio".to_string(),
                "bestvideo+bestaudio".to_string(),
                "best".to_string(),
            ],
            postprocessors: vec![PostProcessor {
                kind: PostProcessorKind::Convert,
                target_container: TARGET_CONTAINER.to_string(),
            }],
        }
    } else {
        FormatPolicy {
            tiers: vec!["best[ext=mp4]".to_string(), "best".to_string()],
            postprocessors: vec![],
        }
    }
}

/// Browser/version fingerprint for TLS/HTTP client impersonation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpersonationProfile {
    pub browser: String,
    pub version: String,
}

impl ImpersonationProfile {
    pub fn chrome() -> Self {
        Self {
            browser: "chrome".to_string(),
            version: "124".to_string(),
        }
    }

    /// Render as a yt-dlp `--impersonate` target.
    pub fn target(&self) -> String {
        format!("{}-{}", self.browser, self.version)
    }
}

/// Outbound request identity: fixed browser-like headers plus optional
/// client impersonation when the engine supports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    pub user_agent: &'static str,
    pub referer: &'static str,
    pub accept_language: &'static str,
    pub impersonation: Option<ImpersonationProfile>,
}

/// Assemble the static header set, attaching the impersonation profile when
/// one was probed. Absence of impersonation degrades silently.
pub fn build_identity(impersonation: Option<ImpersonationProfile>) -> RequestIdentity {
    RequestIdentity {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                     AppleWebKit/537.36 (KHTML, like Gecko) \
                     Chrome/124.0.0.0 Safari/537.36",
        referer: "https://www.tiktok.com/",
        accept_language: "en-US,en;q=0.9",
        impersonation,
    }
}
