//! Integration-style tests covering the probe → policy → transfer flow
//! without hitting the network: the engine binary is replaced by a script.

use tikload::capability::CapabilityState;
use tikload::policy::{build_identity, build_policy};
use tikload::progress::ProgressEvent;
use tikload::{DownloadOutcome, DownloadRequest, TikloadError, TransferEngine};

use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[cfg(unix)]
fn write_fake_engine(dir: &Path, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-yt-dlp");
    fs::write(&path, format!("#!/bin/sh\n{}", body)).expect("write script");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
    path
}

#[cfg(unix)]
fn is_metadata_call() -> &'static str {
    // Shell helper shared by the fake engines: the metadata pre-flight is
    // recognizable by its --dump-json flag.
    r#"
is_meta=0
for a in "$@"; do
  [ "$a" = "--dump-json" ] && is_meta=1
done
"#
}

fn sample_metadata_json() -> &'static str {
    // Carries both the selected media `url` and `webpage_url`, as real
    // single-format dumps do.
    r#"{"id":"7123","title":"clip","url":"https://cdn.example.com/media/7123.mp4","webpage_url":"https://example.com/@user/video/7123","uploader":"user","ext":"mp4","duration":14.0}"#
}

#[test]
fn invalid_urls_rejected_before_any_filesystem_work() {
    let temp = TempDir::new().expect("temp dir");
    let out_dir = temp.path().join("downloads");

    for bad in ["", "   ", "not-a-url", "ftp://example.com/file"] {
        let err = DownloadRequest::with_output_dir(bad, &out_dir).expect_err("must reject");
        assert!(matches!(err, TikloadError::InvalidUrl(_)));
    }

    assert!(!out_dir.exists(), "rejection must not create directories");
}

#[cfg(unix)]
#[tokio::test]
async fn successful_transfer_reports_ordered_progress_and_saved_dir() {
    let temp = TempDir::new().expect("temp dir");
    let out_dir = temp.path().join("downloads");

    let script = format!(
        r#"{meta}
if [ "$is_meta" = "1" ]; then
  echo '{json}'
  exit 0
fi
echo '[download] Destination: downloads/user/clip.mp4'
echo '[download]  10.0% of 1.00MiB at 512.00KiB/s ETA 00:02'
echo '[download]  55.0% of 1.00MiB at 600.00KiB/s ETA 00:01'
echo '[download] 100% of 1.00MiB in 00:02'
exit 0
"#,
        meta = is_metadata_call(),
        json = sample_metadata_json(),
    );
    let engine = TransferEngine::with_path(write_fake_engine(temp.path(), &script));

    let request =
        DownloadRequest::with_output_dir("https://example.com/@user/video/7123", &out_dir)
            .expect("valid request");
    let capability = CapabilityState {
        remux_available: true,
    };
    let policy = build_policy(&capability);
    let identity = build_identity(None);

    let mut events: Vec<ProgressEvent> = Vec::new();
    let outcome = engine
        .execute(&request, &policy, &identity, |event| {
            events.push(event.clone())
        })
        .await
        .expect("no fatal error");

    // Progress arrived in order, then exactly one terminal Finished event.
    assert_eq!(events.len(), 4);
    for event in &events[..3] {
        assert!(matches!(event, ProgressEvent::Downloading { .. }));
    }
    match &events[3] {
        ProgressEvent::Finished { filename } => assert!(filename.ends_with("clip.mp4")),
        other => panic!("expected Finished, got {:?}", other),
    }

    assert!(out_dir.exists(), "output directory created on demand");
    match outcome {
        DownloadOutcome::Success { saved_dir } => {
            assert!(saved_dir.is_absolute());
            assert!(saved_dir.ends_with("downloads/user"));
        }
        DownloadOutcome::Failure { message } => panic!("unexpected failure: {}", message),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn already_downloaded_file_is_skipped_not_refetched() {
    let temp = TempDir::new().expect("temp dir");
    let out_dir = temp.path().join("downloads");

    let script = format!(
        r#"{meta}
if [ "$is_meta" = "1" ]; then
  echo '{json}'
  exit 0
fi
echo '[download] downloads/user/clip.mp4 has already been downloaded'
exit 0
"#,
        meta = is_metadata_call(),
        json = sample_metadata_json(),
    );
    let engine = TransferEngine::with_path(write_fake_engine(temp.path(), &script));

    let request =
        DownloadRequest::with_output_dir("https://example.com/@user/video/7123", &out_dir)
            .expect("valid request");
    let policy = build_policy(&CapabilityState {
        remux_available: false,
    });
    let identity = build_identity(None);

    let mut events: Vec<ProgressEvent> = Vec::new();
    let outcome = engine
        .execute(&request, &policy, &identity, |event| {
            events.push(event.clone())
        })
        .await
        .expect("no fatal error");

    assert!(matches!(outcome, DownloadOutcome::Success { .. }));
    assert_eq!(events.len(), 1, "skip produces only the Finished event");
    match &events[0] {
        ProgressEvent::Finished { filename } => assert!(filename.ends_with("clip.mp4")),
        other => panic!("expected Finished, got {:?}", other),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn engine_reported_error_becomes_failure_with_full_checklist() {
    let temp = TempDir::new().expect("temp dir");
    let out_dir = temp.path().join("downloads");

    let script = format!(
        r#"{meta}
if [ "$is_meta" = "1" ]; then
  echo '{json}'
  exit 0
fi
echo 'ERROR: Unable to download webpage: HTTP Error 403: Forbidden' 1>&2
exit 1
"#,
        meta = is_metadata_call(),
        json = sample_metadata_json(),
    );
    let engine = TransferEngine::with_path(write_fake_engine(temp.path(), &script));

    let request =
        DownloadRequest::with_output_dir("https://example.com/@user/video/7123", &out_dir)
            .expect("valid request");
    let policy = build_policy(&CapabilityState {
        remux_available: true,
    });
    let identity = build_identity(None);

    let mut events: Vec<ProgressEvent> = Vec::new();
    let outcome = engine
        .execute(&request, &policy, &identity, |event| {
            events.push(event.clone())
        })
        .await
        .expect("reported download errors never crash");

    match outcome {
        DownloadOutcome::Failure { message } => {
            assert!(message.contains("403"), "engine message surfaced: {}", message)
        }
        DownloadOutcome::Success { .. } => panic!("expected failure"),
    }
    assert_eq!(events, vec![ProgressEvent::Error]);

    // The operator guidance that accompanies every failure.
    assert_eq!(tikload::advisor::advise().len(), 6);
}

#[cfg(unix)]
#[tokio::test]
async fn metadata_phase_error_is_also_recoverable() {
    let temp = TempDir::new().expect("temp dir");
    let out_dir = temp.path().join("downloads");

    let script = format!(
        r#"{meta}
if [ "$is_meta" = "1" ]; then
  echo 'ERROR: Video unavailable' 1>&2
  exit 1
fi
exit 1
"#,
        meta = is_metadata_call(),
    );
    let engine = TransferEngine::with_path(write_fake_engine(temp.path(), &script));

    let request =
        DownloadRequest::with_output_dir("https://example.com/@user/video/7123", &out_dir)
            .expect("valid request");
    let policy = build_policy(&CapabilityState {
        remux_available: false,
    });
    let identity = build_identity(None);

    let outcome = engine
        .execute(&request, &policy, &identity, |_| {})
        .await
        .expect("no fatal error");

    match outcome {
        DownloadOutcome::Failure { message } => assert_eq!(message, "Video unavailable"),
        DownloadOutcome::Success { .. } => panic!("expected failure"),
    }
}

#[test]
fn remux_capability_drives_policy_shape() {
    let with_ffmpeg = build_policy(&CapabilityState {
        remux_available: true,
    });
    assert_eq!(with_ffmpeg.tiers.len(), 4);
    assert_eq!(with_ffmpeg.postprocessors.len(), 1);

    let without_ffmpeg = build_policy(&CapabilityState {
        remux_available: false,
    });
    assert_eq!(without_ffmpeg.tiers.len(), 2);
    assert!(without_ffmpeg.postprocessors.is_empty());
}
