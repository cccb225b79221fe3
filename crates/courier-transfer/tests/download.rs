use std::time::Duration;

use courier_fs::{AtomicWriteOptions, find_orphans};
use courier_transfer::mock::ScriptedClient;
use courier_transfer::{CancelScope, Downloader, ErrorClass, Interrupt, RetryPolicy, TransferError};
use tempfile::tempdir;

#[tokio::test(start_paused = true)]
async fn hung_request_gives_up_at_deadline() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("preview.mov");
    let client = ScriptedClient::new().hang();
    let scope = CancelScope::new().with_timeout(Duration::from_secs(5));

    let err = Downloader::new(&client)
        .download("https://cdn.example/preview.mov", &path, false, &scope)
        .await
        .unwrap_err();

    assert!(matches!(
        err.source,
        TransferError::Interrupted(Interrupt::DeadlineExceeded)
    ));
    assert_eq!(err.class(), ErrorClass::Cancellation);
    assert_eq!(err.attempts, 1);
    assert!(!path.exists());
}

#[tokio::test(start_paused = true)]
async fn failed_attempts_leave_no_debris() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shot.png");
    std::fs::write(&path, "AAAA").unwrap();

    let client = ScriptedClient::new()
        .respond_then_fail(200, "image/png", ["BB"], "reset")
        .respond_then_fail(200, "image/png", ["BB"], "reset");
    let downloader = Downloader::new(&client).with_policy(RetryPolicy::new().max_attempts(2));

    let err = downloader
        .download("https://cdn.example/shot.png", &path, true, &CancelScope::new())
        .await
        .unwrap_err();

    assert_eq!(err.class(), ErrorClass::TransientNetwork);
    assert_eq!(err.attempts, 2);
    assert_eq!(err.last_content_type.as_deref(), Some("image/png"));
    assert_eq!(std::fs::read(&path).unwrap(), b"AAAA");
    assert!(find_orphans(dir.path(), &AtomicWriteOptions::new()).unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn cancel_mid_body_keeps_original() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shot.png");
    std::fs::write(&path, "AAAA").unwrap();

    let client = ScriptedClient::new().respond_then_hang(200, "image/png", ["NEW", "PARTIAL"]);
    let scope = CancelScope::new();
    tokio::spawn({
        let scope = scope.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            scope.cancel();
        }
    });

    let err = Downloader::new(&client)
        .download("https://cdn.example/shot.png", &path, true, &scope)
        .await
        .unwrap_err();

    assert!(matches!(err.source, TransferError::Interrupted(Interrupt::Cancelled)));
    assert_eq!(err.attempts, 1);
    assert_eq!(client.calls(), 1);
    assert_eq!(std::fs::read(&path).unwrap(), b"AAAA");
    assert!(find_orphans(dir.path(), &AtomicWriteOptions::new()).unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn backoff_follows_policy() {
    let dir = tempdir().unwrap();
    let client = ScriptedClient::new()
        .status(502, "")
        .status(502, "")
        .status(502, "")
        .status(502, "");
    let downloader = Downloader::new(&client);

    let start = tokio::time::Instant::now();
    let err = downloader
        .download("https://cdn.example/a.png", dir.path().join("a.png"), false, &CancelScope::new())
        .await
        .unwrap_err();

    // 200ms + 400ms + 800ms between four attempts, no wait after the last.
    assert!(start.elapsed() >= Duration::from_millis(1400));
    assert!(start.elapsed() < Duration::from_millis(1500));
    assert_eq!(err.attempts, 4);
    assert_eq!(err.last_content_type.as_deref(), Some("text/plain"));
}

#[tokio::test]
async fn creates_missing_parent_directories() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("exports/2026/shot.png");
    let client = ScriptedClient::new().respond(200, "image/png", ["png"]);

    let done = Downloader::new(&client)
        .download("https://cdn.example/shot.png", &path, false, &CancelScope::new())
        .await
        .unwrap();

    assert_eq!(done.bytes_written, 3);
    assert_eq!(std::fs::read(&path).unwrap(), b"png");
}
