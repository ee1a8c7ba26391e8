// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Translates a remote listing/delta page into `MetaStore` mutations.
//!
//! Keyed by `remote_id` so a rename (same remote id, new `remote_path`)
//! is recognized as a modification rather than a delete+create. Folders
//! are materialized here, synchronously, rather than left `Pending` for
//! the Downloader — by the time `reconcile_page` returns, every folder
//! in the page exists on disk (or is `Error`), so file writes that
//! follow never race their parent directory into existence.

use crate::driver::{ChangeEntry, ChangePage};
use crate::file_ops;
use std::collections::HashMap;
use std::path::Path;
use sync_core::{Item, ItemId, ItemKind, SyncState};
use sync_storage::{MaterializedState, StorageEvent};

/// Result of folding one [`ChangePage`] against the current state.
pub struct ReconcileOutcome {
    /// Events to append to the WAL, in order.
    pub events: Vec<StorageEvent>,
    /// Count of entries classified as new or modified — fed to
    /// `DiscoveringFiles`.
    pub discovered: usize,
    /// Deletions seen but not propagated because delete-propagation is
    /// off. Recorded so the caller can log them rather than silently
    /// drop the information.
    pub skipped_deletions: usize,
}

pub struct Reconciler;

impl Reconciler {
    /// Fold `page` against `state`, returning the events to append.
    /// Does not mutate `state` itself — the caller applies the returned
    /// events through the normal WAL → `MaterializedState::apply_event`
    /// path, so reconciliation and durability stay on one code path.
    pub fn reconcile_page(
        state: &MaterializedState,
        page: &ChangePage,
        sync_root: &Path,
        delete_propagation: bool,
        export_formats: &HashMap<String, String>,
        now_ms: u64,
    ) -> ReconcileOutcome {
        let by_remote_id: HashMap<&str, &Item> =
            state.items.values().map(|item| (item.remote_id.as_str(), item)).collect();

        let mut events = Vec::new();
        let mut discovered = 0usize;
        let mut skipped_deletions = 0usize;

        for change in &page.entries {
            match change {
                ChangeEntry::Upserted(entry) => {
                    let existing = by_remote_id.get(entry.remote_id.as_str()).copied();

                    let unchanged = existing.is_some_and(|item| {
                        item.remote_modified_ms == entry.remote_modified_ms
                            && item.checksum == entry.checksum
                            && item.remote_path == entry.remote_path
                    });
                    if unchanged {
                        continue;
                    }

                    let local_path = match file_ops::local_path_of(sync_root, &entry.remote_path) {
                        Ok(path) => path,
                        Err(_) => {
                            // An adversarial or malformed remote path never
                            // produces a write; skip this entry entirely.
                            continue;
                        }
                    };
                    let local_path = apply_export_extension(local_path, entry, export_formats);

                    let item = build_item(existing, entry, local_path, now_ms);
                    discovered += 1;
                    events.push(StorageEvent::ItemUpserted { item });
                }
                ChangeEntry::Removed { remote_id } => {
                    let Some(existing) = by_remote_id.get(remote_id.as_str()).copied() else {
                        continue;
                    };
                    if delete_propagation {
                        events.push(StorageEvent::ItemDeleted { id: existing.id.clone() });
                    } else {
                        skipped_deletions += 1;
                        tracing::info!(
                            remote_id = %remote_id,
                            "deletion detected but delete propagation is disabled; leaving record in place"
                        );
                    }
                }
            }
        }

        ReconcileOutcome { events, discovered, skipped_deletions }
    }
}

fn build_item(
    existing: Option<&Item>,
    entry: &crate::driver::RemoteEntry,
    local_path: std::path::PathBuf,
    now_ms: u64,
) -> Item {
    let (id, created_at_ms) = match existing {
        Some(item) => (item.id.clone(), item.created_at_ms),
        None => (ItemId::new(), now_ms),
    };

    let sync_state = match entry.kind {
        ItemKind::Folder => match file_ops::ensure_directory(&local_path) {
            Ok(()) => SyncState::Complete { completed_at_ms: now_ms },
            Err(e) => SyncState::Error { message: e.to_string(), failed_at_ms: now_ms, attempt: 0 },
        },
        ItemKind::File | ItemKind::Exported => SyncState::Pending,
        // A shortcut has nothing to transfer — it resolves to another
        // item's id, which the caller follows at read time. Recorded as
        // already complete so it never reaches the Downloader.
        ItemKind::Shortcut => {
            if entry.shortcut_target_id.is_none() {
                tracing::warn!(remote_id = %entry.remote_id, "shortcut has no target id");
            }
            SyncState::Complete { completed_at_ms: now_ms }
        }
    };

    Item {
        id,
        remote_id: entry.remote_id.clone(),
        kind: entry.kind,
        remote_path: entry.remote_path.clone(),
        local_path,
        size_bytes: entry.size_bytes,
        checksum: entry.checksum.clone(),
        mime_type: entry.mime_type.clone(),
        shortcut_target_id: entry.shortcut_target_id.clone(),
        remote_modified_ms: entry.remote_modified_ms,
        sync_state,
        created_at_ms,
        updated_at_ms: now_ms,
    }
}

/// For an `Exported` entry, append the configured extension for its MIME
/// type (if any) to the local path the caller would otherwise write a
/// plain copy to — e.g. a vendor's native document format exported as
/// PDF needs `.pdf` appended, since its remote name carries none.
fn apply_export_extension(
    local_path: std::path::PathBuf,
    entry: &crate::driver::RemoteEntry,
    export_formats: &HashMap<String, String>,
) -> std::path::PathBuf {
    if entry.kind != ItemKind::Exported {
        return local_path;
    }
    let Some(mime) = entry.mime_type.as_deref() else {
        return local_path;
    };
    let Some(ext) = export_formats.get(mime) else {
        return local_path;
    };
    let mut name = local_path.file_name().and_then(|n| n.to_str()).unwrap_or("export").to_string();
    name.push('.');
    name.push_str(ext);
    local_path.with_file_name(name)
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
