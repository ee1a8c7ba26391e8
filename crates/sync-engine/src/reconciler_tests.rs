// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::driver::RemoteEntry;
use std::collections::HashMap;
use sync_core::ItemKind;
use sync_storage::MaterializedState;
use tempfile::tempdir;

fn file_entry(remote_id: &str, remote_path: &str, modified_ms: u64) -> RemoteEntry {
    RemoteEntry {
        remote_id: remote_id.to_string(),
        kind: ItemKind::File,
        remote_path: remote_path.to_string(),
        size_bytes: 10,
        checksum: Some("abc".to_string()),
        remote_modified_ms: modified_ms,
        mime_type: None,
        shortcut_target_id: None,
    }
}

fn no_exports() -> HashMap<String, String> {
    HashMap::new()
}

#[test]
fn new_file_is_discovered_and_left_pending() {
    let dir = tempdir().unwrap();
    let state = MaterializedState::default();
    let page = ChangePage {
        entries: vec![ChangeEntry::Upserted(file_entry("r1", "a.txt", 1))],
        next_cursor: "1".into(),
        has_more: false,
    };

    let outcome = Reconciler::reconcile_page(&state, &page, dir.path(), true, &no_exports(), 100);

    assert_eq!(outcome.discovered, 1);
    assert_eq!(outcome.events.len(), 1);
    match &outcome.events[0] {
        StorageEvent::ItemUpserted { item } => {
            assert_eq!(item.sync_state, SyncState::Pending);
            assert_eq!(item.remote_id, "r1");
        }
        other => panic!("expected ItemUpserted, got {other:?}"),
    }
}

#[test]
fn new_folder_is_materialized_synchronously() {
    let dir = tempdir().unwrap();
    let state = MaterializedState::default();
    let entry = RemoteEntry {
        remote_id: "folder1".into(),
        kind: ItemKind::Folder,
        remote_path: "photos".into(),
        size_bytes: 0,
        checksum: None,
        remote_modified_ms: 1,
        mime_type: None,
        shortcut_target_id: None,
    };
    let page = ChangePage { entries: vec![ChangeEntry::Upserted(entry)], next_cursor: "1".into(), has_more: false };

    let outcome = Reconciler::reconcile_page(&state, &page, dir.path(), true, &no_exports(), 100);

    assert_eq!(outcome.discovered, 1);
    assert!(dir.path().join("photos").is_dir());
    match &outcome.events[0] {
        StorageEvent::ItemUpserted { item } => {
            assert!(matches!(item.sync_state, SyncState::Complete { .. }));
        }
        other => panic!("expected ItemUpserted, got {other:?}"),
    }
}

#[test]
fn unchanged_entry_produces_no_event() {
    let dir = tempdir().unwrap();
    let mut state = MaterializedState::default();
    let page = ChangePage {
        entries: vec![ChangeEntry::Upserted(file_entry("r1", "a.txt", 1))],
        next_cursor: "1".into(),
        has_more: false,
    };
    let first = Reconciler::reconcile_page(&state, &page, dir.path(), true, &no_exports(), 100);
    for event in &first.events {
        state.apply_event(event);
    }

    let second = Reconciler::reconcile_page(&state, &page, dir.path(), true, &no_exports(), 200);

    assert_eq!(second.discovered, 0);
    assert!(second.events.is_empty());
}

#[test]
fn rename_is_treated_as_a_modification_not_a_delete_and_create() {
    let dir = tempdir().unwrap();
    let mut state = MaterializedState::default();
    let first_page = ChangePage {
        entries: vec![ChangeEntry::Upserted(file_entry("r1", "old-name.txt", 1))],
        next_cursor: "1".into(),
        has_more: false,
    };
    let first = Reconciler::reconcile_page(&state, &first_page, dir.path(), true, &no_exports(), 100);
    for event in &first.events {
        state.apply_event(event);
    }
    let original_id = state.items.values().next().unwrap().id.clone();

    let rename_page = ChangePage {
        entries: vec![ChangeEntry::Upserted(file_entry("r1", "new-name.txt", 2))],
        next_cursor: "2".into(),
        has_more: false,
    };
    let outcome = Reconciler::reconcile_page(&state, &rename_page, dir.path(), true, &no_exports(), 200);

    assert_eq!(outcome.events.len(), 1);
    match &outcome.events[0] {
        StorageEvent::ItemUpserted { item } => {
            assert_eq!(item.id, original_id);
            assert_eq!(item.remote_path, "new-name.txt");
        }
        other => panic!("expected ItemUpserted, got {other:?}"),
    }
}

#[test]
fn removal_propagates_as_item_deleted_when_enabled() {
    let dir = tempdir().unwrap();
    let mut state = MaterializedState::default();
    let page = ChangePage {
        entries: vec![ChangeEntry::Upserted(file_entry("r1", "a.txt", 1))],
        next_cursor: "1".into(),
        has_more: false,
    };
    let first = Reconciler::reconcile_page(&state, &page, dir.path(), true, &no_exports(), 100);
    for event in &first.events {
        state.apply_event(event);
    }

    let removal_page =
        ChangePage { entries: vec![ChangeEntry::Removed { remote_id: "r1".into() }], next_cursor: "2".into(), has_more: false };
    let outcome = Reconciler::reconcile_page(&state, &removal_page, dir.path(), true, &no_exports(), 200);

    assert_eq!(outcome.events.len(), 1);
    assert!(matches!(&outcome.events[0], StorageEvent::ItemDeleted { .. }));
    assert_eq!(outcome.skipped_deletions, 0);
}

#[test]
fn removal_is_skipped_not_dropped_when_propagation_disabled() {
    let dir = tempdir().unwrap();
    let mut state = MaterializedState::default();
    let page = ChangePage {
        entries: vec![ChangeEntry::Upserted(file_entry("r1", "a.txt", 1))],
        next_cursor: "1".into(),
        has_more: false,
    };
    let first = Reconciler::reconcile_page(&state, &page, dir.path(), false, &no_exports(), 100);
    for event in &first.events {
        state.apply_event(event);
    }

    let removal_page =
        ChangePage { entries: vec![ChangeEntry::Removed { remote_id: "r1".into() }], next_cursor: "2".into(), has_more: false };
    let outcome = Reconciler::reconcile_page(&state, &removal_page, dir.path(), false, &no_exports(), 200);

    assert!(outcome.events.is_empty());
    assert_eq!(outcome.skipped_deletions, 1);
}

#[test]
fn removal_of_unknown_remote_id_is_a_no_op() {
    let dir = tempdir().unwrap();
    let state = MaterializedState::default();
    let page =
        ChangePage { entries: vec![ChangeEntry::Removed { remote_id: "ghost".into() }], next_cursor: "1".into(), has_more: false };

    let outcome = Reconciler::reconcile_page(&state, &page, dir.path(), true, &no_exports(), 100);

    assert!(outcome.events.is_empty());
    assert_eq!(outcome.skipped_deletions, 0);
}

#[test]
fn exported_item_is_left_pending_for_the_downloader() {
    let dir = tempdir().unwrap();
    let state = MaterializedState::default();
    let entry = RemoteEntry {
        remote_id: "doc1".into(),
        kind: ItemKind::Exported,
        remote_path: "notes".into(),
        size_bytes: 0,
        checksum: None,
        remote_modified_ms: 1,
        mime_type: Some("application/vnd.example.doc".into()),
        shortcut_target_id: None,
    };
    let page = ChangePage { entries: vec![ChangeEntry::Upserted(entry)], next_cursor: "1".into(), has_more: false };

    let outcome = Reconciler::reconcile_page(&state, &page, dir.path(), true, &no_exports(), 100);

    match &outcome.events[0] {
        StorageEvent::ItemUpserted { item } => {
            assert_eq!(item.sync_state, SyncState::Pending);
            assert_eq!(item.local_path, dir.path().join("notes"));
        }
        other => panic!("expected ItemUpserted, got {other:?}"),
    }
}

#[test]
fn exported_item_gets_the_configured_extension_appended() {
    let dir = tempdir().unwrap();
    let state = MaterializedState::default();
    let entry = RemoteEntry {
        remote_id: "doc1".into(),
        kind: ItemKind::Exported,
        remote_path: "notes".into(),
        size_bytes: 0,
        checksum: None,
        remote_modified_ms: 1,
        mime_type: Some("application/vnd.example.doc".into()),
        shortcut_target_id: None,
    };
    let page = ChangePage { entries: vec![ChangeEntry::Upserted(entry)], next_cursor: "1".into(), has_more: false };
    let mut formats = HashMap::new();
    formats.insert("application/vnd.example.doc".to_string(), "pdf".to_string());

    let outcome = Reconciler::reconcile_page(&state, &page, dir.path(), true, &formats, 100);

    match &outcome.events[0] {
        StorageEvent::ItemUpserted { item } => {
            assert_eq!(item.local_path, dir.path().join("notes.pdf"));
        }
        other => panic!("expected ItemUpserted, got {other:?}"),
    }
}

#[test]
fn shortcut_is_marked_complete_without_queuing_a_download() {
    let dir = tempdir().unwrap();
    let state = MaterializedState::default();
    let entry = RemoteEntry {
        remote_id: "link1".into(),
        kind: ItemKind::Shortcut,
        remote_path: "link-to-doc".into(),
        size_bytes: 0,
        checksum: None,
        remote_modified_ms: 1,
        mime_type: None,
        shortcut_target_id: Some("doc1".into()),
    };
    let page = ChangePage { entries: vec![ChangeEntry::Upserted(entry)], next_cursor: "1".into(), has_more: false };

    let outcome = Reconciler::reconcile_page(&state, &page, dir.path(), true, &no_exports(), 100);

    match &outcome.events[0] {
        StorageEvent::ItemUpserted { item } => {
            assert!(matches!(item.sync_state, SyncState::Complete { .. }));
            assert_eq!(item.shortcut_target_id.as_deref(), Some("doc1"));
        }
        other => panic!("expected ItemUpserted, got {other:?}"),
    }
}

#[test]
fn malformed_remote_path_is_skipped_entirely() {
    let dir = tempdir().unwrap();
    let state = MaterializedState::default();
    let page = ChangePage {
        entries: vec![ChangeEntry::Upserted(file_entry("r1", "../escape.txt", 1))],
        next_cursor: "1".into(),
        has_more: false,
    };

    let outcome = Reconciler::reconcile_page(&state, &page, dir.path(), true, &no_exports(), 100);

    assert_eq!(outcome.discovered, 0);
    assert!(outcome.events.is_empty());
}
