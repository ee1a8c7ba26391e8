// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `SyncEvent`: what external observers (CLI, daemon IPC clients) see.
//!
//! Deliberately distinct from [`sync_storage::StorageEvent`] — that type
//! is what the WAL persists and replays; this one is an ephemeral,
//! lossy-under-backpressure progress feed. Conflating the two would tie
//! durable storage format to wire format, and this event carries fields
//! (`name`, `total_bytes`) that have no business in the WAL.

use serde::{Deserialize, Serialize};

/// Emitted over the run's `mpsc` channel and mirrored to IPC clients.
///
/// Ordering guarantees (enforced by the producer, not this type):
/// `Started` is always first; `Completed`/`Failed` is always last and
/// unique; `FileQueued(id)` precedes `FileDownloading(id)`, which
/// precedes `FileCompleted(id)`/`FileFailed(id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SyncEvent {
    Started { run_id: String, started_at_ms: u64 },
    DiscoveringFiles { files_found: u64 },
    FileQueued { remote_id: String, remote_path: String, size_bytes: Option<u64> },
    FileDownloading { remote_id: String, remote_path: String, bytes_downloaded: u64, total_bytes: Option<u64> },
    FileCompleted { remote_id: String, remote_path: String },
    FileFailed { remote_id: String, remote_path: String, error: String },
    Progress { files_processed: u64, total_files: u64, bytes_downloaded: u64 },
    Completed { files_processed: u64, bytes_downloaded: u64, failed_files: u64, duration_ms: u64 },
    Failed { error: String },
}

impl SyncEvent {
    /// Lifecycle events must always be delivered even when a slow
    /// consumer forces the channel to apply backpressure; progress
    /// events are best-effort and may be dropped under lag. The
    /// producer checks this before choosing `send` vs `try_send`.
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, SyncEvent::Started { .. } | SyncEvent::Completed { .. } | SyncEvent::Failed { .. })
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
