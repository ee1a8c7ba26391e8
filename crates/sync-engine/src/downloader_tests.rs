// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::PathBuf;
use sync_adapters::FakeDriver;
use sync_core::clock::FakeClock;
use sync_core::{ItemId, ItemKind, SyncState};
use tempfile::tempdir;

fn pending_item(remote_id: &str, local_path: PathBuf, checksum: Option<&str>) -> Item {
    Item {
        id: ItemId::new(),
        remote_id: remote_id.to_string(),
        kind: ItemKind::File,
        remote_path: format!("{remote_id}.txt"),
        local_path,
        size_bytes: 5,
        checksum: checksum.map(ToString::to_string),
        mime_type: None,
        shortcut_target_id: None,
        remote_modified_ms: 1,
        sync_state: SyncState::Pending,
        created_at_ms: 0,
        updated_at_ms: 0,
    }
}

#[tokio::test]
async fn download_one_materializes_the_file() {
    let dir = tempdir().unwrap();
    let driver = FakeDriver::new();
    driver.seed_file(
        crate::driver::RemoteEntry {
            remote_id: "a".into(),
            kind: ItemKind::File,
            remote_path: "a.txt".into(),
            size_bytes: 5,
            checksum: None,
            remote_modified_ms: 1,
            mime_type: None,
            shortcut_target_id: None,
        },
        b"hello".to_vec(),
    );

    let item = pending_item("a", dir.path().join("a.txt"), None);
    let downloader = Downloader::new(4, 3, std::time::Duration::ZERO);
    let clock = FakeClock::new();

    let outcome = downloader.download_one(&driver, &item, 1, &clock, |_| {}).await;

    match &outcome {
        DownloadOutcome::Completed { bytes_downloaded, .. } => assert_eq!(*bytes_downloaded, 5),
        other => panic!("expected Completed, got {other:?}"),
    }
    assert_eq!(std::fs::read(dir.path().join("a.txt")).unwrap(), b"hello");
}

#[tokio::test]
async fn download_one_fails_on_checksum_mismatch() {
    let dir = tempdir().unwrap();
    let driver = FakeDriver::new();
    driver.seed_file(
        crate::driver::RemoteEntry {
            remote_id: "a".into(),
            kind: ItemKind::File,
            remote_path: "a.txt".into(),
            size_bytes: 5,
            checksum: None,
            remote_modified_ms: 1,
            mime_type: None,
            shortcut_target_id: None,
        },
        b"hello".to_vec(),
    );

    let item = pending_item("a", dir.path().join("a.txt"), Some("deadbeef"));
    let downloader = Downloader::new(4, 3, std::time::Duration::ZERO);
    let clock = FakeClock::new();

    let outcome = downloader.download_one(&driver, &item, 1, &clock, |_| {}).await;

    match outcome {
        DownloadOutcome::Failed { error, attempt } => {
            assert!(matches!(error, SyncError::ChecksumMismatch { .. }));
            assert_eq!(attempt, 1);
        }
        other => panic!("expected Failed, got {other:?}"),
    }
    assert!(!dir.path().join("a.txt").exists());
}

#[tokio::test]
async fn download_one_propagates_driver_errors() {
    let dir = tempdir().unwrap();
    let driver = FakeDriver::new();
    let item = pending_item("missing", dir.path().join("missing.txt"), None);
    let downloader = Downloader::new(4, 1, std::time::Duration::ZERO);
    let clock = FakeClock::new();

    let outcome = downloader.download_one(&driver, &item, 1, &clock, |_| {}).await;

    assert!(matches!(outcome, DownloadOutcome::Failed { .. }));
}

#[tokio::test]
async fn download_one_reports_progress_via_the_callback() {
    let dir = tempdir().unwrap();
    let driver = FakeDriver::new();
    driver.seed_file(
        crate::driver::RemoteEntry {
            remote_id: "a".into(),
            kind: ItemKind::File,
            remote_path: "a.txt".into(),
            size_bytes: 5,
            checksum: None,
            remote_modified_ms: 1,
            mime_type: None,
            shortcut_target_id: None,
        },
        b"hello".to_vec(),
    );

    let item = pending_item("a", dir.path().join("a.txt"), None);
    let downloader = Downloader::new(4, 3, std::time::Duration::ZERO);
    let clock = FakeClock::new();

    let seen = std::sync::Arc::new(std::sync::atomic::AtomicU64::new(0));
    let seen_clone = seen.clone();
    let outcome = downloader
        .download_one(&driver, &item, 1, &clock, move |n| {
            seen_clone.store(n, std::sync::atomic::Ordering::Relaxed);
        })
        .await;

    assert!(matches!(outcome, DownloadOutcome::Completed { .. }));
    assert_eq!(seen.load(std::sync::atomic::Ordering::Relaxed), 5);
}

#[tokio::test]
async fn concurrent_downloads_are_bounded_by_the_semaphore() {
    let dir = tempdir().unwrap();
    let driver = FakeDriver::new();
    for i in 0..5 {
        driver.seed_file(
            crate::driver::RemoteEntry {
                remote_id: i.to_string(),
                kind: ItemKind::File,
                remote_path: format!("{i}.txt"),
                size_bytes: 1,
                checksum: None,
                remote_modified_ms: 1,
                mime_type: None,
                shortcut_target_id: None,
            },
            b"x".to_vec(),
        );
    }

    let downloader = Downloader::new(2, 3, std::time::Duration::ZERO);
    let clock = FakeClock::new();
    let mut outcomes = Vec::new();
    for i in 0..5 {
        let item = pending_item(&i.to_string(), dir.path().join(format!("{i}.txt")), None);
        outcomes.push(downloader.download_one(&driver, &item, 1, &clock, |_| {}).await);
    }

    assert!(outcomes.iter().all(|o| matches!(o, DownloadOutcome::Completed { .. })));
}
