// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pull-style status DTOs, as opposed to the pushed [`crate::SyncEvent`]
//! stream: a snapshot of where things stand right now, and the current
//! list of permanently-failed items.

use serde::{Deserialize, Serialize};

/// Snapshot returned by a `getSyncStatus`-style query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatusSnapshot {
    pub last_sync_at_ms: Option<u64>,
    pub total_items: u64,
    pub total_size_bytes: u64,
    pub pending_count: u64,
    pub failed_count: u64,
}

/// One entry in `getFailedFiles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedFileEntry {
    pub remote_id: String,
    pub remote_path: String,
    pub error_message: String,
    pub failed_at_ms: u64,
    pub attempt: u32,
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
