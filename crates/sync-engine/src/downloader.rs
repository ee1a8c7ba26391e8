// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-item transfer: acquire a concurrency permit, flip state, stream to
//! temp, verify, commit, report.
//!
//! The state machine itself lives on [`sync_core::item::SyncState`];
//! this module only drives the transitions and owns the semaphore that
//! bounds how many are `Downloading` at once.

use crate::driver::RemoteDriver;
use crate::file_ops::{self, FileOpsError};
use crate::retry_exec;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use sync_core::{Clock, Item, SyncError};
use tokio::sync::Semaphore;

/// Outcome of one item's transfer attempt, fed back into
/// [`crate::controller::SyncController`] to update `MetaStore` and emit
/// a `SyncEvent`.
#[derive(Debug)]
pub enum DownloadOutcome {
    Completed { checksum: String, bytes_downloaded: u64 },
    Failed { error: SyncError, attempt: u32 },
}

/// Bounds simultaneous materializations at `max_concurrent`. Folders
/// acquire the same permit as files — cheap, but counted, so a page full
/// of folders doesn't starve the semaphore for the files that follow.
pub struct Downloader {
    semaphore: Arc<Semaphore>,
    retry_attempts: u32,
    retry_base_delay: std::time::Duration,
}

impl Downloader {
    pub fn new(max_concurrent: usize, retry_attempts: u32, retry_base_delay: std::time::Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            retry_attempts,
            retry_base_delay,
        }
    }

    /// Download and materialize a single binary item. Folders are
    /// handled by the caller directly via [`file_ops::ensure_directory`]
    /// since they need no driver round-trip. `on_progress` is called
    /// with the cumulative byte count as the transfer proceeds.
    pub async fn download_one<C: Clock>(
        &self,
        driver: &dyn RemoteDriver,
        item: &Item,
        attempt: u32,
        clock: &C,
        on_progress: impl Fn(u64) + Send + Sync + 'static,
    ) -> DownloadOutcome {
        let _permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                return DownloadOutcome::Failed {
                    error: SyncError::Cancelled,
                    attempt,
                };
            }
        };

        match self.fetch_and_commit(driver, item, clock.epoch_ms(), on_progress).await {
            Ok((checksum, bytes_downloaded)) => DownloadOutcome::Completed { checksum, bytes_downloaded },
            Err(error) => DownloadOutcome::Failed { error, attempt },
        }
    }

    async fn fetch_and_commit(
        &self,
        driver: &dyn RemoteDriver,
        item: &Item,
        now_ms: u64,
        on_progress: impl Fn(u64) + Send + Sync + 'static,
    ) -> Result<(String, u64), SyncError> {
        let received = Arc::new(AtomicU64::new(0));
        let received_for_callback = received.clone();
        let callback: crate::driver::ProgressCallback = Arc::new(move |n| {
            received_for_callback.store(n, Ordering::Relaxed);
            on_progress(n);
        });

        let remote_id = item.remote_id.clone();
        let bytes = retry_exec::with_retry(self.retry_attempts, self.retry_base_delay, now_ms, || {
            let remote_id = remote_id.clone();
            let callback = callback.clone();
            async move { driver.download(&remote_id, callback).await }
        })
        .await?;

        let bytes_downloaded = received.load(Ordering::Relaxed).max(bytes.len() as u64);
        let dest = item.local_path.clone();
        let expected = item.checksum.clone();
        let data = bytes;

        let digest =
            tokio::task::spawn_blocking(move || commit_blocking(&dest, &data, expected.as_deref()))
                .await
                .map_err(|e| SyncError::Io(std::io::Error::other(e)))??;
        Ok((digest, bytes_downloaded))
    }
}

fn commit_blocking(
    dest: &Path,
    data: &[u8],
    expected_checksum: Option<&str>,
) -> Result<String, SyncError> {
    file_ops::materialize(dest, data, expected_checksum).map_err(|e| match e {
        FileOpsError::ChecksumMismatch { expected, actual } => {
            SyncError::ChecksumMismatch { expected, actual }
        }
        FileOpsError::Io(io_err) => SyncError::Io(io_err),
        FileOpsError::PathGuard(guard_err) => SyncError::PathGuard(guard_err),
    })
}

#[cfg(test)]
#[path = "downloader_tests.rs"]
mod tests;
