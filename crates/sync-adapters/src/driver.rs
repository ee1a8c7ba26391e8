// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`RemoteDriver`] implementations.
//!
//! [`FilesystemDriver`] treats a second local directory tree as "the
//! remote" — the production backend for deployments where the source
//! of truth is a mounted or otherwise locally-visible drive rather than
//! a vendor cloud API. A deployment syncing from a proprietary cloud
//! provider instead would implement `RemoteDriver` against that
//! provider's SDK; nothing here is specific to the filesystem case
//! beyond this one adapter.
//!
//! [`FakeDriver`] drives tests across `sync-engine` and the daemon
//! without touching any filesystem or network, mirroring the fakes
//! pattern used for [`crate::notify::FakeNotifyAdapter`].

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use sync_core::{DriverError, ItemKind};
use sync_engine::{ChangeEntry, ChangePage, ProgressCallback, RemoteDriver, RemoteEntry};

/// A [`RemoteDriver`] backed by a directory on the same machine (or a
/// network mount presented as one).
///
/// Identity is the entry's path relative to `remote_root`: there is no
/// separate remote id to key on, so a rename looks like a deletion plus
/// a new upload rather than a move — a real cloud-drive API's stable
/// file ids would let the Reconciler detect renames instead. Listings
/// are a full re-walk every call, filtered to entries modified since
/// the cursor's timestamp; removals are not reported, since detecting
/// them would require this driver to keep its own state rather than
/// simply reading the directory, so `delete_propagation` has no effect
/// against this backend.
pub struct FilesystemDriver {
    remote_root: PathBuf,
}

impl FilesystemDriver {
    pub fn new(remote_root: impl Into<PathBuf>) -> Self {
        Self { remote_root: remote_root.into() }
    }
}

#[async_trait]
impl RemoteDriver for FilesystemDriver {
    async fn current_cursor(&self) -> Result<String, DriverError> {
        Ok("0".to_string())
    }

    async fn list_changes(&self, cursor: Option<&str>) -> Result<ChangePage, DriverError> {
        let since_ms: u64 = cursor.and_then(|c| c.parse().ok()).unwrap_or(0);
        let root = self.remote_root.clone();
        let entries = tokio::task::spawn_blocking(move || walk(&root, since_ms))
            .await
            .map_err(|e| DriverError::permanent(format!("filesystem walk panicked: {e}")))??;

        let next_cursor = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis()
            .to_string();

        Ok(ChangePage { entries, next_cursor, has_more: false })
    }

    async fn download(&self, remote_id: &str, on_progress: ProgressCallback) -> Result<Vec<u8>, DriverError> {
        let path = self.remote_root.join(remote_id);
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| DriverError::permanent(format!("reading {}: {e}", path.display())))?;
        on_progress(bytes.len() as u64);
        Ok(bytes)
    }
}

fn walk(root: &Path, since_ms: u64) -> Result<Vec<ChangeEntry>, DriverError> {
    let mut entries = Vec::new();
    for dirent in walkdir::WalkDir::new(root).min_depth(1) {
        let dirent = dirent.map_err(|e| DriverError::transient(format!("directory walk: {e}")))?;
        let relative = dirent
            .path()
            .strip_prefix(root)
            .map_err(|e| DriverError::permanent(format!("path outside root: {e}")))?;
        let Some(remote_path) = relative.to_str() else {
            continue;
        };

        let metadata = dirent.metadata().map_err(|e| DriverError::transient(format!("stat: {e}")))?;
        let modified_ms = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        if modified_ms <= since_ms {
            continue;
        }

        let kind = if dirent.file_type().is_dir() { ItemKind::Folder } else { ItemKind::File };
        let checksum = if kind == ItemKind::File {
            Some(hex_sha256(dirent.path())?)
        } else {
            None
        };

        entries.push(ChangeEntry::Upserted(RemoteEntry {
            remote_id: remote_path.to_string(),
            kind,
            remote_path: remote_path.to_string(),
            size_bytes: metadata.len(),
            checksum,
            remote_modified_ms: modified_ms,
            mime_type: None,
            shortcut_target_id: None,
        }));
    }
    Ok(entries)
}

fn hex_sha256(path: &Path) -> Result<String, DriverError> {
    let bytes = std::fs::read(path).map_err(|e| DriverError::transient(format!("reading {}: {e}", path.display())))?;
    let digest = Sha256::digest(&bytes);
    Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use sync_core::DriverError;
use sync_engine::{ChangeEntry, ChangePage, ProgressCallback, RemoteDriver, RemoteEntry};

struct FakeDriverState {
    entries: HashMap<String, (RemoteEntry, Vec<u8>)>,
    pending_removals: Vec<String>,
    cursor_seq: u64,
    fail_next_list: Option<String>,
    fail_list_transient_remaining: u32,
}

/// A controllable, in-process stand-in for a real cloud-drive client.
///
/// Every call to [`FakeDriver::list_changes`] returns the full current
/// set of entries as upserts (content-addressed by `remote_modified_ms`/
/// `checksum`, so the Reconciler's unchanged-detection still exercises
/// normally) plus whatever removals were queued by [`FakeDriver::remove`]
/// since the last call. This is a full-snapshot-each-time fake, not an
/// actual delta feed — good enough to drive the Reconciler/Downloader
/// contract without modeling a real change-token protocol.
#[derive(Clone)]
pub struct FakeDriver {
    state: Arc<Mutex<FakeDriverState>>,
}

impl Default for FakeDriver {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeDriverState {
                entries: HashMap::new(),
                pending_removals: Vec::new(),
                cursor_seq: 0,
                fail_next_list: None,
                fail_list_transient_remaining: 0,
            })),
        }
    }
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed (or replace) a file entry and its content.
    pub fn seed_file(&self, entry: RemoteEntry, content: Vec<u8>) {
        self.state.lock().entries.insert(entry.remote_id.clone(), (entry, content));
    }

    /// Queue a removal signal for the next `list_changes` call.
    pub fn remove(&self, remote_id: impl Into<String>) {
        let remote_id = remote_id.into();
        let mut state = self.state.lock();
        state.entries.remove(&remote_id);
        state.pending_removals.push(remote_id);
    }

    /// Make the next `list_changes` call fail with a permanent error,
    /// exercising the fatal-listing-error path.
    pub fn fail_next_list_changes(&self, message: impl Into<String>) {
        self.state.lock().fail_next_list = Some(message.into());
    }

    /// Make the next `count` `list_changes` calls fail with a transient
    /// error, exercising a retrying caller's backoff-and-recover path.
    pub fn fail_list_changes_transiently(&self, count: u32) {
        self.state.lock().fail_list_transient_remaining = count;
    }
}

#[async_trait]
impl RemoteDriver for FakeDriver {
    async fn current_cursor(&self) -> Result<String, DriverError> {
        Ok(self.state.lock().cursor_seq.to_string())
    }

    async fn list_changes(&self, _cursor: Option<&str>) -> Result<ChangePage, DriverError> {
        let mut state = self.state.lock();
        if let Some(message) = state.fail_next_list.take() {
            return Err(DriverError::permanent(message));
        }
        if state.fail_list_transient_remaining > 0 {
            state.fail_list_transient_remaining -= 1;
            return Err(DriverError::transient("temporarily unavailable"));
        }

        let mut entries: Vec<ChangeEntry> =
            state.entries.values().map(|(entry, _)| ChangeEntry::Upserted(entry.clone())).collect();
        for remote_id in state.pending_removals.drain(..) {
            entries.push(ChangeEntry::Removed { remote_id });
        }

        state.cursor_seq += 1;
        Ok(ChangePage { entries, next_cursor: state.cursor_seq.to_string(), has_more: false })
    }

    async fn download(&self, remote_id: &str, on_progress: ProgressCallback) -> Result<Vec<u8>, DriverError> {
        let content = {
            let state = self.state.lock();
            state
                .entries
                .get(remote_id)
                .map(|(_, content)| content.clone())
                .ok_or_else(|| DriverError::permanent(format!("no such remote id: {remote_id}")))?
        };
        on_progress(content.len() as u64);
        Ok(content)
    }
}

} // mod fake

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeDriver;

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
