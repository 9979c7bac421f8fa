//! Transfer executor driving the external yt-dlp engine
//!
//! One `execute` call is one blocking transfer: metadata pre-flight, then
//! the download subprocess with its stdout streamed into progress events.
//! Only yt-dlp's own reported download errors (`ERROR:` lines) are absorbed
//! into a `Failure` outcome; anything else propagates.

use crate::capability::find_ytdlp;
use crate::error::TikloadError;
use crate::models::VideoInfo;
use crate::policy::{FormatPolicy, RequestIdentity, TARGET_CONTAINER};
use crate::progress::{
    parse_destination, parse_merge_destination, parse_progress_line, ProgressEvent,
};
use anyhow::Result;
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command as AsyncCommand;
use tracing::{debug, error, info, warn};

/// Default directory for saved videos, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "tiktok_downloads";

/// One download job. Immutable after construction; the URL invariant is
/// enforced here so no transfer (or filesystem write) can start from an
/// invalid request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    url: String,
    output_dir: PathBuf,
}

impl DownloadRequest {
    pub fn new(url: &str) -> Result<Self, TikloadError> {
        Self::with_output_dir(url, DEFAULT_OUTPUT_DIR)
    }

    pub fn with_output_dir(url: &str, output_dir: impl Into<PathBuf>) -> Result<Self, TikloadError> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(TikloadError::InvalidUrl("no URL provided".to_string()));
        }
        if !trimmed.starts_with("http") {
            return Err(TikloadError::InvalidUrl(format!(
                "must start with 'https://': {}",
                trimmed
            )));
        }
        Ok(Self {
            url: trimmed.to_string(),
            output_dir: output_dir.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// Terminal result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Success { saved_dir: PathBuf },
    Failure { message: String },
}

/// Executes transfers by delegating to the resolved yt-dlp binary.
pub struct TransferEngine {
    ytdlp_path: PathBuf,
}

impl TransferEngine {
    /// Resolve yt-dlp and build the engine. Fails only when the binary is
    /// missing entirely.
    pub fn new() -> Result<Self, TikloadError> {
        let ytdlp_path = find_ytdlp().ok_or(TikloadError::EngineNotFound)?;
        Ok(Self { ytdlp_path })
    }

    /// Build against a known binary path (used by tests).
    pub fn with_path(ytdlp_path: impl Into<PathBuf>) -> Self {
        Self {
            ytdlp_path: ytdlp_path.into(),
        }
    }

    pub fn ytdlp_path(&self) -> &Path {
        &self.ytdlp_path
    }

    /// Resolve video metadata without downloading.
    /// Uses: yt-dlp --dump-json --no-download
    async fn extract_info(
        &self,
        url: &str,
        identity: &RequestIdentity,
    ) -> Result<VideoInfo, TikloadError> {
        debug!("Extracting video info for URL: {}", url);

        let output = AsyncCommand::new(&self.ytdlp_path)
            .arg("--dump-json")
            .arg("--no-download")
            .arg("--no-warnings")
            .args(identity_args(identity))
            .arg(url)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("yt-dlp extraction failed: {}", stderr.trim());
            return Err(classify_engine_stderr(&stderr));
        }

        let info: VideoInfo = serde_json::from_slice(&output.stdout)?;
        Ok(info)
    }

    /// Run one transfer end to end.
    ///
    /// Ensures the output directory exists, resolves metadata, then streams
    /// the download with progress delivered synchronously, in order, to
    /// `on_progress`. Engine-reported download errors become
    /// `DownloadOutcome::Failure`; unexpected failures propagate.
    pub async fn execute(
        &self,
        request: &DownloadRequest,
        policy: &FormatPolicy,
        identity: &RequestIdentity,
        mut on_progress: impl FnMut(&ProgressEvent),
    ) -> Result<DownloadOutcome> {
        tokio::fs::create_dir_all(request.output_dir()).await?;

        let info = match self.extract_info(request.url(), identity).await {
            Ok(info) => info,
            Err(TikloadError::DownloadError(message)) => {
                on_progress(&ProgressEvent::Error);
                return Ok(DownloadOutcome::Failure { message });
            }
            Err(other) => return Err(other.into()),
        };
        info!("Resolved \"{}\" by {}", info.title, info.uploader_or_unknown());

        let mut child = AsyncCommand::new(&self.ytdlp_path)
            .args(download_args(request, policy, identity))
            .arg(request.url())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stderr = child.stderr.take().expect("stderr piped");
        let stderr_task = tokio::spawn(async move {
            let mut reported_error: Option<String> = None;
            let mut tail = String::new();
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(message) = line.strip_prefix("ERROR: ") {
                    if reported_error.is_none() {
                        reported_error = Some(message.to_string());
                    }
                }
                tail = line;
            }
            (reported_error, tail)
        });

        // Progress is parsed inline so the callback sees events strictly in
        // the order the engine emitted them.
        let stdout = child.stdout.take().expect("stdout piped");
        let mut saved_file: Option<String> = None;
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            if let Some(event) = parse_progress_line(&line) {
                on_progress(&event);
            } else if let Some(path) = parse_merge_destination(&line) {
                saved_file = Some(path);
            } else if let Some(path) = parse_destination(&line) {
                saved_file = Some(path);
            }
        }

        let status = child.wait().await?;
        let (reported_error, stderr_tail) = stderr_task.await?;

        if status.success() {
            let filename = saved_file.unwrap_or_else(|| {
                format!("{}.{}", info.title, info.ext.as_deref().unwrap_or(TARGET_CONTAINER))
            });
            on_progress(&ProgressEvent::Finished { filename });

            let saved_dir = request.output_dir().join(info.uploader_or_unknown());
            let saved_dir = saved_dir.absolutize()?.into_owned();
            Ok(DownloadOutcome::Success { saved_dir })
        } else {
            on_progress(&ProgressEvent::Error);
            match reported_error {
                Some(message) => {
                    warn!("yt-dlp reported download error: {}", message);
                    Ok(DownloadOutcome::Failure { message })
                }
                // Non-zero exit without a reported download error is not
                // the recoverable category; let it surface.
                None => Err(anyhow::anyhow!(
                    "yt-dlp exited with {}: {}",
                    status,
                    stderr_tail
                )),
            }
        }
    }
}

/// Map engine stderr to the error taxonomy: `ERROR:` lines are yt-dlp's
/// own download-error reporting (recoverable), anything else is not.
fn classify_engine_stderr(stderr: &str) -> TikloadError {
    for line in stderr.lines() {
        if let Some(message) = line.strip_prefix("ERROR: ") {
            return TikloadError::DownloadError(message.to_string());
        }
    }
    TikloadError::ExtractionError(stderr.trim().to_string())
}

/// Header and impersonation flags shared by metadata and download calls.
fn identity_args(identity: &RequestIdentity) -> Vec<String> {
    let mut args = vec![
        "--user-agent".to_string(),
        identity.user_agent.to_string(),
        "--add-header".to_string(),
        format!("Referer:{}", identity.referer),
        "--add-header".to_string(),
        format!("Accept-Language:{}", identity.accept_language),
    ];
    if let Some(profile) = &identity.impersonation {
        args.push("--impersonate".to_string());
        args.push(profile.target());
    }
    args
}

/// Full argument list for the download subprocess (URL excluded).
fn download_args(
    request: &DownloadRequest,
    policy: &FormatPolicy,
    identity: &RequestIdentity,
) -> Vec<String> {
    let template = request
        .output_dir()
        .join("%(uploader)s")
        .join("%(title)s.%(ext)s");

    let mut args = vec![
        "--output".to_string(),
        template.to_string_lossy().into_owned(),
        "--format".to_string(),
        policy.selector(),
        "--merge-output-format".to_string(),
        TARGET_CONTAINER.to_string(),
        "--no-overwrites".to_string(),
        "--newline".to_string(),
        "--no-warnings".to_string(),
    ];
    for pp in &policy.postprocessors {
        // PostProcessorKind::Convert: repackage without re-encoding
        args.push("--remux-video".to_string());
        args.push(pp.target_container.clone());
    }
    args.extend(identity_args(identity));
    args
}
