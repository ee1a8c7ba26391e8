// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The boundary to the remote cloud-drive client.
//!
//! Everything on the other side of [`RemoteDriver`] is out of scope: auth,
//! transport, retries at the HTTP layer. The driver only needs to report
//! whether its own errors are worth retrying; [`crate::retry`](sync_core::retry)
//! does the rest.

use async_trait::async_trait;
use std::sync::Arc;
use sync_core::{DriverError, ItemKind};

/// One entry in a remote listing or delta page.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteEntry {
    pub remote_id: String,
    pub kind: ItemKind,
    pub remote_path: String,
    pub size_bytes: u64,
    pub checksum: Option<String>,
    pub remote_modified_ms: u64,
    /// Source MIME type, set only for `ItemKind::Exported` entries.
    pub mime_type: Option<String>,
    /// Remote id the entry points at, set only for `ItemKind::Shortcut`.
    pub shortcut_target_id: Option<String>,
}

/// Reports bytes received so far for one `download` call. Called once
/// per chunk by a streaming driver, or once with the full size by a
/// driver that fetches the whole body at once.
pub type ProgressCallback = Arc<dyn Fn(u64) + Send + Sync>;

/// One change in a delta page: either an upsert or a removal signal.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEntry {
    Upserted(RemoteEntry),
    Removed { remote_id: String },
}

/// A page of changes plus the cursor to resume from.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangePage {
    pub entries: Vec<ChangeEntry>,
    pub next_cursor: String,
    pub has_more: bool,
}

/// Consumed by [`crate::reconciler::Reconciler`] and
/// [`crate::downloader::Downloader`]. A driver implementation owns
/// authentication and transport; every method here is fallible and the
/// error carries its own transient/permanent classification.
#[async_trait]
pub trait RemoteDriver: Send + Sync + 'static {
    /// A fresh change-cursor snapshot, used to seed the very first
    /// incremental reconciliation.
    async fn current_cursor(&self) -> Result<String, DriverError>;

    /// One page of changes since `cursor`. `cursor = None` requests a full
    /// listing (the initial-sync path); `Some(token)` requests only what
    /// changed since that token.
    async fn list_changes(&self, cursor: Option<&str>) -> Result<ChangePage, DriverError>;

    /// Fetch the full content of `remote_id`. Returns the bytes in memory:
    /// items this engine tracks are individual files, not the multi-GB
    /// media this trait would need streaming for. `on_progress` is
    /// invoked with the number of bytes received so far; a driver with
    /// no chunked transport may simply call it once with the final size.
    async fn download(&self, remote_id: &str, on_progress: ProgressCallback) -> Result<Vec<u8>, DriverError>;
}
