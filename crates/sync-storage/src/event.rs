// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The WAL's event type.
//!
//! `StorageEvent` is internal to MetaStore: it is what the WAL persists
//! and what [`MaterializedState::apply_event`] replays. It is distinct
//! from `sync_wire::SyncEvent`, the externally observable progress
//! stream — a reconciliation page can produce many `StorageEvent`s for
//! a single externally visible "run progressed" notification.

use serde::{Deserialize, Serialize};
use sync_core::{ChangeCursor, Item, ItemId, RunId, RunStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StorageEvent {
    /// A new item was discovered, or an existing item's metadata changed
    /// (path, size, checksum, remote_modified_ms) without a sync-state
    /// transition. Upsert semantics: applying twice with the same data
    /// is a no-op.
    ItemUpserted { item: Item },
    /// An item's `sync_state` changed (Pending/Downloading/Complete/Error).
    ItemStateChanged { id: ItemId, state: sync_core::SyncState, updated_at_ms: u64 },
    /// An item was removed from the remote and delete-propagation is on,
    /// or the local record should simply stop being tracked.
    ItemDeleted { id: ItemId },
    /// A run was created and entered `Running`.
    RunCreated { run: sync_core::SyncRun },
    /// A run's progress counters changed.
    RunProgressed { id: RunId, progress: sync_core::RunProgress },
    /// A run reached a terminal status.
    RunFinished { id: RunId, status: RunStatus },
    /// A delta cursor advanced for a scope.
    CursorAdvanced { cursor: ChangeCursor },
    /// Marker written on graceful shutdown; carries no state change but
    /// lets recovery distinguish a clean stop from a crash mid-WAL.
    Shutdown,
}
