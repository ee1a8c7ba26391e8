// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Item` data model: one remote file or folder tracked by
//! [`MetaStore`](crate), with its download/materialize state.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Opaque local identifier for a tracked item, derived from the
    /// remote id the first time it is seen. Stable across renames.
    pub struct ItemId("item");
}

/// What kind of remote entry this item represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    File,
    Folder,
    /// A remote-native document materialized by export rather than raw
    /// byte transfer (e.g. a Google Doc), written to disk with the
    /// extension from [`crate::config::Config::export_formats`].
    Exported,
    /// A pointer to another item. Never materialized as a symlink; the
    /// Reconciler routes these straight to `Complete` with a warning.
    Shortcut,
}

crate::simple_display! {
    ItemKind {
        File => "file",
        Folder => "folder",
        Exported => "exported",
        Shortcut => "shortcut",
    }
}

/// Data-carrying sync state for an [`Item`].
///
/// A tag-only [`SyncStateKind`] exists alongside this for wire/DTO use
/// and for state-machine transition tables that don't need the attached
/// data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SyncState {
    /// Known from a listing/delta but not yet downloaded.
    Pending,
    /// A [`crate::retry`]-governed download is in flight or queued to retry.
    Downloading { attempt: u32 },
    /// Materialized on disk and checksum-verified.
    Complete { completed_at_ms: u64 },
    /// Permanently failed: retry budget exhausted or a non-retryable error.
    Error { message: String, failed_at_ms: u64, attempt: u32 },
}

impl SyncState {
    pub fn kind(&self) -> SyncStateKind {
        SyncStateKind::from(self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncState::Complete { .. } | SyncState::Error { .. })
    }
}

/// Tag-only counterpart of [`SyncState`], used where only the state name
/// matters (status summaries, wire DTOs, transition guards).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStateKind {
    Pending,
    Downloading,
    Complete,
    Error,
}

crate::simple_display! {
    SyncStateKind {
        Pending => "pending",
        Downloading => "downloading",
        Complete => "complete",
        Error => "error",
    }
}

impl From<&SyncState> for SyncStateKind {
    fn from(state: &SyncState) -> Self {
        match state {
            SyncState::Pending => SyncStateKind::Pending,
            SyncState::Downloading { .. } => SyncStateKind::Downloading,
            SyncState::Complete { .. } => SyncStateKind::Complete,
            SyncState::Error { .. } => SyncStateKind::Error,
        }
    }
}

/// A single tracked remote item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    /// Identifier assigned by the remote; stable across renames/moves.
    /// This is what the Reconciler keys rename detection on.
    pub remote_id: String,
    pub kind: ItemKind,
    /// Current remote path, already sanitized (never contains `..`).
    pub remote_path: String,
    pub local_path: std::path::PathBuf,
    pub size_bytes: u64,
    pub checksum: Option<String>,
    /// Source MIME type as reported by the remote. Only meaningful for
    /// `Exported` items, where it selects the target extension out of
    /// `export_formats`; `None` for everything else.
    pub mime_type: Option<String>,
    /// Remote id of the item a `Shortcut` points at.
    pub shortcut_target_id: Option<String>,
    pub remote_modified_ms: u64,
    pub sync_state: SyncState,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Item {
    crate::setters! {
        set { size_bytes: u64 }
        option { checksum: String }
        option { mime_type: String }
        option { shortcut_target_id: String }
    }

    pub fn is_terminal(&self) -> bool {
        self.sync_state.is_terminal()
    }

    /// Transition to `Downloading`, bumping the attempt counter. Idempotent
    /// with respect to which attempt is recorded: callers always pass the
    /// attempt number they are about to make.
    pub fn begin_download(&mut self, attempt: u32, now_ms: u64) {
        self.sync_state = SyncState::Downloading { attempt };
        self.updated_at_ms = now_ms;
    }

    pub fn mark_complete(&mut self, now_ms: u64) {
        self.sync_state = SyncState::Complete { completed_at_ms: now_ms };
        self.updated_at_ms = now_ms;
    }

    pub fn mark_error(&mut self, message: String, attempt: u32, now_ms: u64) {
        self.sync_state = SyncState::Error { message, failed_at_ms: now_ms, attempt };
        self.updated_at_ms = now_ms;
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct ItemBuilder => Item {
        computed { id: ItemId = ItemId::new() }
        into { remote_id: String = "remote-1" }
        set { kind: ItemKind = ItemKind::File }
        into { remote_path: String = "a.txt" }
        into { local_path: std::path::PathBuf = std::path::PathBuf::from("a.txt") }
        set { size_bytes: u64 = 0 }
        option { checksum: String = None }
        option { mime_type: String = None }
        option { shortcut_target_id: String = None }
        set { remote_modified_ms: u64 = 0 }
        set { sync_state: SyncState = SyncState::Pending }
        set { created_at_ms: u64 = 0 }
        set { updated_at_ms: u64 = 0 }
    }
}

#[cfg(test)]
#[path = "item_tests.rs"]
mod tests;
