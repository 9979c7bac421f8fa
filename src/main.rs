//! tikload - TikTok Video Downloader by URL
//!
//! Single-shot CLI: resolves one video URL through yt-dlp, picking the
//! format fallback chain from local ffmpeg availability and attaching
//! browser-like request identity to get past basic bot detection.

use anyhow::Result;
use clap::Parser;
use std::io::Write;
use tikload::advisor::advise;
use tikload::capability::{probe_impersonation, CapabilityState};
use tikload::policy::{build_identity, build_policy};
use tikload::{DownloadOutcome, DownloadRequest, ProgressReporter, TikloadError, TransferEngine};

#[derive(Parser)]
#[command(name = "tikload", version, about = "Download a single TikTok video by URL")]
struct Args {
    /// Video URL (prompted interactively when omitted)
    url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    println!("{}", "=".repeat(56));
    println!("        🎵  TikTok Video Downloader by URL  🎵");
    println!("{}", "=".repeat(56));

    let url = match args.url {
        Some(url) => url,
        None => prompt_for_url()?,
    };

    let request = match DownloadRequest::new(&url) {
        Ok(request) => request,
        Err(TikloadError::InvalidUrl(reason)) => {
            eprintln!("❌  Invalid URL — {}", reason);
            std::process::exit(1);
        }
        Err(other) => return Err(other.into()),
    };

    println!();
    let code = download(&request).await?;
    std::process::exit(code)
}

/// Run the full probe → policy → transfer → report sequence.
///
/// Returns the process exit code: 0 on success, 2 on a reported transfer
/// failure. The non-zero failure code is deliberate so scripts can tell a
/// failed transfer (2) from a usage error (1).
async fn download(request: &DownloadRequest) -> Result<i32> {
    let engine = TransferEngine::new()?;

    let capability = CapabilityState::detect();
    if capability.remux_available {
        println!("✔  ffmpeg detected — output will be remuxed to mp4.\n");
    } else {
        println!("⚠️  ffmpeg not found — downloading best pre-muxed mp4.\n");
    }
    let policy = build_policy(&capability);

    let impersonation = probe_impersonation(engine.ytdlp_path()).await;
    if let Some(profile) = &impersonation {
        println!("✔  client impersonation enabled ({}).\n", profile.target());
    }
    let identity = build_identity(impersonation);

    let mut reporter = ProgressReporter::stdout();
    let outcome = engine
        .execute(request, &policy, &identity, |event| reporter.handle(event))
        .await?;

    match outcome {
        DownloadOutcome::Success { saved_dir } => {
            println!("\n✅  Video saved to: {}", saved_dir.display());
            Ok(0)
        }
        DownloadOutcome::Failure { message } => {
            println!("\n❌  Download failed: {}", message);
            println!("\n💡  Troubleshooting tips:");
            for (index, hint) in advise().iter().enumerate() {
                println!("  {}. {}", index + 1, hint);
            }
            println!();
            Ok(2)
        }
    }
}

/// Interactive mode: read one line from stdin.
fn prompt_for_url() -> Result<String> {
    println!("\nPaste the full TikTok video URL below.");
    println!("Example: https://www.tiktok.com/@username/video/123...\n");
    print!("🔗  Video URL: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
