// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Writing and loading zstd-compressed snapshots.

use crate::migration::check_version;
use crate::snapshot::{Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
use crate::state::MaterializedState;
use chrono::Utc;
use std::path::PathBuf;

/// Result of a successful checkpoint write.
#[derive(Debug, Clone, Copy)]
pub struct CheckpointResult {
    pub seq: u64,
    pub size_bytes: u64,
}

/// Writes [`Snapshot`]s to a fixed path, compressed with zstd so a large
/// materialized state doesn't dominate startup disk I/O.
pub struct Checkpointer {
    path: PathBuf,
}

impl Checkpointer {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Serialize, compress, and durably write `state` at `seq`.
    ///
    /// Writes to a `.tmp` sibling first and renames into place so a
    /// crash mid-write never leaves a half-written snapshot where
    /// [`load_snapshot`] would find it.
    pub fn checkpoint_sync(
        &self,
        seq: u64,
        state: &MaterializedState,
    ) -> Result<CheckpointResult, SnapshotError> {
        let snapshot =
            Snapshot { version: CURRENT_SNAPSHOT_VERSION, seq, state: state.clone(), created_at: Utc::now() };
        let json = serde_json::to_vec(&snapshot)?;
        let compressed = zstd::encode_all(json.as_slice(), 0).map_err(SnapshotError::Compression)?;

        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, &compressed)?;
        std::fs::rename(&tmp_path, &self.path)?;

        Ok(CheckpointResult { seq, size_bytes: compressed.len() as u64 })
    }
}

/// Load and decompress the snapshot at `path`, if one exists.
pub fn load_snapshot(path: &std::path::Path) -> Result<Option<Snapshot>, SnapshotError> {
    if !path.exists() {
        return Ok(None);
    }
    let compressed = std::fs::read(path)?;
    let json = zstd::decode_all(compressed.as_slice()).map_err(SnapshotError::Compression)?;
    let snapshot: Snapshot = serde_json::from_slice(&json)?;
    check_version(snapshot.version, CURRENT_SNAPSHOT_VERSION)?;
    Ok(Some(snapshot))
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
