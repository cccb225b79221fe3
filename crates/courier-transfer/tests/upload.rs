use std::time::Duration;

use courier_transfer::data::{HttpHeader, RemoteRecord, UploadOperation};
use courier_transfer::mock::{MockRemote, RemoteEvent, ScriptedClient};
use courier_transfer::{AssetDeliveryState, CancelScope, DeliveryState, ErrorClass, TransferError, Uploader};
use tempfile::tempdir;

fn part(offset: u64, length: u64) -> UploadOperation {
    UploadOperation {
        method:          "PUT".into(),
        url:             format!("https://upload.example/asset-1/{offset}"),
        offset,
        length,
        request_headers: vec![HttpHeader {
            name:  "Content-Type".into(),
            value: "image/png".into(),
        }],
    }
}

fn record(parts: Vec<UploadOperation>) -> RemoteRecord {
    RemoteRecord {
        id:                "asset-1".into(),
        upload_operations: parts,
    }
}

fn state(raw: &str) -> AssetDeliveryState { AssetDeliveryState::new(DeliveryState::parse(raw)) }

#[tokio::test(start_paused = true)]
async fn uploads_parts_commits_and_waits() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shot.png");
    std::fs::write(&path, "hello world").unwrap();

    let client = ScriptedClient::new().status(200, "").status(200, "");
    let remote = MockRemote::new(record(vec![part(0, 6), part(6, 5)])).states([
        state("AWAITING_UPLOAD"),
        state("PROCESSING"),
        state("COMPLETE"),
    ]);

    let result = Uploader::new(&client)
        .upload(&path, &remote, &CancelScope::new())
        .await
        .unwrap();

    assert_eq!(result.asset_id, "asset-1");
    assert_eq!(result.file_name, "shot.png");
    assert_eq!(result.state, DeliveryState::Complete);
    assert_eq!(result.checksum.hash, "5eb63bbbe01eeed093cb22bb8f5acdc3");

    let sent = client.requests();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].method, "PUT");
    assert_eq!(sent[0].body.as_deref(), Some(&b"hello "[..]));
    assert_eq!(sent[1].body.as_deref(), Some(&b"world"[..]));
    assert_eq!(sent[1].get_header("content-type"), Some("image/png"));

    let events = remote.events();
    assert_eq!(
        events[0],
        RemoteEvent::Created {
            name: "shot.png".into(),
            size: 11,
            mime: "image/png",
        }
    );
    assert!(matches!(&events[1], RemoteEvent::Committed { asset_id, .. } if asset_id == "asset-1"));
    assert_eq!(remote.fetches(), 3);
}

#[tokio::test(start_paused = true)]
async fn failed_part_aborts_before_commit() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("preview.mov");
    std::fs::write(&path, "0123456789").unwrap();

    let client = ScriptedClient::new()
        .status(200, "")
        .status(500, "upload backend exploded");
    let remote = MockRemote::new(record(vec![part(0, 5), part(5, 5)])).states([state("COMPLETE")]);

    let err = Uploader::new(&client)
        .upload(&path, &remote, &CancelScope::new())
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(500));
    assert!(err.to_string().contains("upload backend exploded"), "{err}");
    assert!(!remote.committed());
    assert_eq!(remote.fetches(), 0);
}

#[tokio::test(start_paused = true)]
async fn record_without_operations_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shot.png");
    std::fs::write(&path, "pixels").unwrap();

    let client = ScriptedClient::new();
    let remote = MockRemote::new(record(Vec::new()));

    let err = Uploader::new(&client)
        .upload(&path, &remote, &CancelScope::new())
        .await
        .unwrap_err();

    assert!(matches!(err, TransferError::Remote(_)));
    assert!(err.to_string().contains("no upload operations"), "{err}");
    assert_eq!(client.calls(), 0);
    assert!(!remote.committed());
}

#[tokio::test(start_paused = true)]
async fn remote_failure_is_reported_with_details() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shot.png");
    std::fs::write(&path, "pixels").unwrap();

    let client = ScriptedClient::new().status(200, "");
    let remote = MockRemote::new(record(vec![part(0, 6)])).states([
        state("PROCESSING"),
        AssetDeliveryState::new(DeliveryState::Failed).with_error("IMAGE_INCORRECT_DIMENSIONS", "wrong size"),
    ]);

    let err = Uploader::new(&client)
        .upload(&path, &remote, &CancelScope::new())
        .await
        .unwrap_err();

    assert_eq!(err.class(), ErrorClass::RemoteProcessingFailed);
    assert_eq!(
        err.to_string(),
        "asset asset-1 delivery failed: IMAGE_INCORRECT_DIMENSIONS: wrong size"
    );
    assert!(remote.committed());
}

#[tokio::test(start_paused = true)]
async fn delivery_wait_respects_upload_timeout() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shot.png");
    std::fs::write(&path, "pixels").unwrap();

    let client = ScriptedClient::new().status(200, "");
    let remote = MockRemote::new(record(vec![part(0, 6)])).states([state("PROCESSING")]);

    let err = Uploader::new(&client)
        .with_timeout(Some(Duration::from_secs(30)))
        .upload(&path, &remote, &CancelScope::new())
        .await
        .unwrap_err();

    match err {
        TransferError::DeliveryTimedOut {
            asset_id, last_state, ..
        } => {
            assert_eq!(asset_id, "asset-1");
            assert_eq!(last_state, Some(DeliveryState::Processing));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(remote.fetches() >= 15);
}

#[tokio::test(start_paused = true)]
async fn upload_all_walks_directory_in_order() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("b.png"), "bbbb").unwrap();
    std::fs::write(dir.path().join("a.png"), "aaaa").unwrap();

    let client = ScriptedClient::new().status(200, "").status(200, "");
    let remote = MockRemote::new(record(vec![part(0, 4)])).states([state("COMPLETE")]);

    let results = Uploader::new(&client)
        .upload_all(dir.path(), &remote, &CancelScope::new())
        .await
        .unwrap();

    let names: Vec<_> = results.iter().map(|r| r.file_name.as_str()).collect();
    assert_eq!(names, ["a.png", "b.png"]);
    assert_eq!(client.requests()[0].body.as_deref(), Some(&b"aaaa"[..]));
}

#[tokio::test]
async fn cancelled_scope_uploads_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("shot.png");
    std::fs::write(&path, "pixels").unwrap();

    let client = ScriptedClient::new().status(200, "");
    let remote = MockRemote::new(record(vec![part(0, 6)]));
    let scope = CancelScope::new();
    scope.cancel();

    let err = Uploader::new(&client).upload(&path, &remote, &scope).await.unwrap_err();

    assert_eq!(err.class(), ErrorClass::Cancellation);
    assert!(remote.events().is_empty());
    assert_eq!(client.calls(), 0);
}
