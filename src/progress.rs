//! Progress events and live single-line reporting
//!
//! The transfer engine turns yt-dlp's `--newline` output into a strict
//! three-variant event stream; the reporter renders it as one live line that
//! is overwritten in place until a terminal event arrives.

use std::io::{self, Write};

/// A single progress observation during one transfer.
///
/// Values are carried as display strings exactly as the engine reported
/// them; this layer formats, it does not measure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Downloading {
        percent: String,
        speed: String,
        eta: String,
    },
    Finished {
        filename: String,
    },
    Error,
}

/// Parse one yt-dlp `--newline` progress line.
///
/// Expected shape: `[download]  42.5% of 3.50MiB at  1.20MiB/s ETA 00:02`.
/// Lines without a percentage (or not from the downloader) return `None`
/// and are ignored by the caller; unknown statuses are a forward-compatible
/// no-op. Missing speed/ETA tokens render as `?`.
pub fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    let rest = line.strip_prefix("[download]")?.trim();
    if !rest.contains('%') {
        return None;
    }

    let percent = rest
        .split_whitespace()
        .find(|token| token.ends_with('%'))?
        .to_string();

    let speed = rest
        .split(" at ")
        .nth(1)
        .and_then(|after| after.split_whitespace().next())
        .filter(|token| token.ends_with("/s"))
        .unwrap_or("?")
        .to_string();

    let eta = rest
        .split(" ETA ")
        .nth(1)
        .and_then(|after| after.split_whitespace().next())
        .unwrap_or("?")
        .to_string();

    Some(ProgressEvent::Downloading {
        percent,
        speed,
        eta,
    })
}

/// Extract the destination filename from yt-dlp output, covering both a
/// fresh transfer and the overwrite-protected skip of an existing file.
pub fn parse_destination(line: &str) -> Option<String> {
    let rest = line.strip_prefix("[download] ")?;
    if let Some(path) = rest.strip_prefix("Destination: ") {
        return Some(path.trim().to_string());
    }
    if let Some(path) = rest.strip_suffix(" has already been downloaded") {
        return Some(path.trim().to_string());
    }
    None
}

/// Merger lines name the final merged file, which supersedes the
/// per-stream destinations seen earlier.
pub fn parse_merge_destination(line: &str) -> Option<String> {
    let rest = line.strip_prefix("[Merger] Merging formats into ")?;
    Some(rest.trim().trim_matches('"').to_string())
}

/// Renders progress events onto one live terminal line.
///
/// Stateless aside from whether an unterminated progress line is currently
/// displayed. Generic over the sink so tests can capture output.
pub struct ProgressReporter<W: Write> {
    out: W,
    line_open: bool,
}

impl ProgressReporter<io::Stdout> {
    pub fn stdout() -> Self {
        ProgressReporter::new(io::stdout())
    }
}

impl<W: Write> ProgressReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            line_open: false,
        }
    }

    /// Consume one event. Rendering failures are swallowed: progress output
    /// must never abort a transfer.
    pub fn handle(&mut self, event: &ProgressEvent) {
        let _ = self.render(event);
    }

    fn render(&mut self, event: &ProgressEvent) -> io::Result<()> {
        match event {
            ProgressEvent::Downloading {
                percent,
                speed,
                eta,
            } => {
                write!(
                    self.out,
                    "\r  ⬇  {}  |  speed: {}  |  ETA: {}   ",
                    percent, speed, eta
                )?;
                self.out.flush()?;
                self.line_open = true;
            }
            ProgressEvent::Finished { filename } => {
                self.finish_line()?;
                let basename = std::path::Path::new(filename)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| filename.clone());
                writeln!(self.out, "  ✔  Download complete → {}", basename)?;
            }
            ProgressEvent::Error => {
                self.finish_line()?;
                writeln!(self.out, "  ❌  An error occurred during download.")?;
            }
        }
        Ok(())
    }

    fn finish_line(&mut self) -> io::Result<()> {
        if self.line_open {
            writeln!(self.out)?;
            self.line_open = false;
        }
        Ok(())
    }
}
