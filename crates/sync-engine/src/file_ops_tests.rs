// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sync_core::ItemKind;
use tempfile::tempdir;

#[test]
fn materialize_writes_file_and_returns_digest() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("hello.txt");

    let digest = materialize(&dest, b"hello world", None).unwrap();

    assert_eq!(fs::read(&dest).unwrap(), b"hello world");
    assert_eq!(digest, hex_sha256(b"hello world"));
}

#[test]
fn materialize_verifies_checksum_before_committing() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("hello.txt");
    let expected = hex_sha256(b"hello world");

    materialize(&dest, b"hello world", Some(&expected)).unwrap();

    assert!(dest.exists());
}

#[test]
fn materialize_rejects_checksum_mismatch_and_leaves_no_temp_file() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("hello.txt");

    let err = materialize(&dest, b"hello world", Some("deadbeef")).unwrap_err();

    assert!(matches!(err, FileOpsError::ChecksumMismatch { .. }));
    assert!(!dest.exists());
    let leftover: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert!(leftover.is_empty(), "temp file was not cleaned up");
}

#[test]
fn materialize_retries_once_on_checksum_mismatch_then_succeeds() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("hello.txt");
    let expected = hex_sha256(b"hello world");
    let mut calls = 0;

    let digest = materialize_from(
        &dest,
        || {
            calls += 1;
            if calls == 1 {
                &b"corrupted on the wire"[..]
            } else {
                &b"hello world"[..]
            }
        },
        Some(&expected),
    )
    .unwrap();

    assert_eq!(calls, 2);
    assert_eq!(digest, expected);
    assert_eq!(fs::read(&dest).unwrap(), b"hello world");
}

#[test]
fn materialize_gives_up_after_two_consecutive_mismatches() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("hello.txt");
    let mut calls = 0;

    let err = materialize_from(
        &dest,
        || {
            calls += 1;
            &b"still wrong"[..]
        },
        Some("deadbeef"),
    )
    .unwrap_err();

    assert_eq!(calls, 2);
    assert!(matches!(err, FileOpsError::ChecksumMismatch { .. }));
    assert!(!dest.exists());
}

#[test]
fn materialize_creates_parent_directories() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("a/b/c/hello.txt");

    materialize(&dest, b"nested", None).unwrap();

    assert_eq!(fs::read(&dest).unwrap(), b"nested");
}

#[test]
fn materialize_overwrites_an_existing_file_atomically() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("hello.txt");
    fs::write(&dest, b"stale content").unwrap();

    materialize(&dest, b"fresh content", None).unwrap();

    assert_eq!(fs::read(&dest).unwrap(), b"fresh content");
}

#[test]
fn resolve_conflict_returns_path_unchanged_when_free() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("new.txt");

    assert_eq!(resolve_conflict(&path), path);
}

#[test]
fn resolve_conflict_appends_counter_suffix() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("report.pdf");
    fs::write(&path, b"one").unwrap();

    let resolved = resolve_conflict(&path);
    assert_eq!(resolved, dir.path().join("report (1).pdf"));
}

#[test]
fn resolve_conflict_skips_taken_counters() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("report.pdf");
    fs::write(&path, b"one").unwrap();
    fs::write(dir.path().join("report (1).pdf"), b"two").unwrap();

    let resolved = resolve_conflict(&path);
    assert_eq!(resolved, dir.path().join("report (2).pdf"));
}

#[test]
fn resolve_conflict_handles_extensionless_files() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("README");
    fs::write(&path, b"one").unwrap();

    let resolved = resolve_conflict(&path);
    assert_eq!(resolved, dir.path().join("README (1)"));
}

#[test]
fn ensure_directory_is_idempotent() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("nested/dir");

    ensure_directory(&target).unwrap();
    ensure_directory(&target).unwrap();

    assert!(target.is_dir());
}

#[test]
fn remove_file_missing_is_not_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gone.txt");

    remove(&path, ItemKind::File).unwrap();
}

#[test]
fn remove_deletes_existing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("present.txt");
    fs::write(&path, b"x").unwrap();

    remove(&path, ItemKind::File).unwrap();

    assert!(!path.exists());
}

#[test]
fn remove_deletes_existing_folder_recursively() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("folder");
    fs::create_dir_all(path.join("child")).unwrap();
    fs::write(path.join("child/file.txt"), b"x").unwrap();

    remove(&path, ItemKind::Folder).unwrap();

    assert!(!path.exists());
}
