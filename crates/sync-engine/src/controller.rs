// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Owns one [`SyncRun`] end to end: opens it, drives the Reconciler then
//! the Downloader pool, updates progress, and emits the [`SyncEvent`]
//! stream a consumer subscribes to.

use crate::driver::RemoteDriver;
use crate::downloader::{DownloadOutcome, Downloader};
use crate::file_ops;
use crate::reconciler::Reconciler;
use crate::retry_exec;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use sync_core::{Clock, Config, ItemKind, RunId, SyncRun};
use sync_storage::{MaterializedState, StorageEvent, Wal};
use sync_wire::SyncEvent;
use tokio::sync::mpsc;

/// How events are delivered, mirroring the channel's own backpressure
/// contract: lifecycle events are worth blocking the run briefly for,
/// progress events are not.
async fn emit(tx: &mpsc::Sender<SyncEvent>, event: SyncEvent) {
    if event.is_lifecycle() {
        let _ = tx.send(event).await;
    } else {
        let _ = tx.try_send(event);
    }
}

/// Orchestrates one run. A fresh `SyncController` is constructed per
/// run; `wal`/`state` are handed back to the caller afterward so the
/// next run (or the status-query side of the daemon) can keep using
/// them.
pub struct SyncController<D: RemoteDriver, C: Clock> {
    config: Config,
    driver: Arc<D>,
    clock: C,
    downloader: Downloader,
}

impl<D: RemoteDriver, C: Clock> SyncController<D, C> {
    pub fn new(config: Config, driver: Arc<D>, clock: C) -> Self {
        let downloader = Downloader::new(
            config.max_concurrent_downloads,
            config.retry_attempts.max(1),
            std::time::Duration::from_secs(config.retry_base_delay_secs),
        );
        Self { config, driver, clock, downloader }
    }

    /// Run one full reconcile-then-download cycle, persisting every
    /// state transition through `wal`/`state` as it happens so a crash
    /// mid-run leaves a resumable, not corrupt, store.
    pub async fn run(
        &self,
        wal: &mut Wal,
        state: &mut MaterializedState,
        events_tx: mpsc::Sender<SyncEvent>,
        cancel: Arc<AtomicBool>,
    ) -> SyncRun {
        let started_at_ms = self.clock.epoch_ms();
        let run_id = RunId::new();
        let mut run = SyncRun::new(run_id.clone(), started_at_ms);

        append(wal, state, StorageEvent::RunCreated { run: run.clone() });
        emit(&events_tx, SyncEvent::Started { run_id: run_id.to_string(), started_at_ms }).await;

        match self.reconcile_and_download(wal, state, &events_tx, &cancel, &mut run).await {
            Ok(()) => {
                self.finalize_success(wal, state, &events_tx, &cancel, &mut run, started_at_ms).await;
            }
            Err(message) => {
                let now_ms = self.clock.epoch_ms();
                run.fail(message.clone(), now_ms);
                append(
                    wal,
                    state,
                    StorageEvent::RunFinished { id: run_id.clone(), status: run.status.clone() },
                );
                emit(&events_tx, SyncEvent::Failed { error: message }).await;
            }
        }

        let _ = wal.flush();
        run
    }

    /// Re-enter the Downloader for every item a prior, interrupted run
    /// left `Pending` or `Downloading`, without re-listing the remote —
    /// called once at daemon startup after a stale `Running` run is
    /// found and marked `Interrupted`. Items are read straight from
    /// `state`, not scoped to the run that originally discovered them,
    /// since that inventory is what's actually outstanding regardless of
    /// which run left it that way.
    pub async fn resume(
        &self,
        wal: &mut Wal,
        state: &mut MaterializedState,
        events_tx: mpsc::Sender<SyncEvent>,
        cancel: Arc<AtomicBool>,
    ) -> SyncRun {
        let started_at_ms = self.clock.epoch_ms();
        let run_id = RunId::new();
        let mut run = SyncRun::new(run_id.clone(), started_at_ms);

        append(wal, state, StorageEvent::RunCreated { run: run.clone() });
        emit(&events_tx, SyncEvent::Started { run_id: run_id.to_string(), started_at_ms }).await;

        let outstanding: Vec<String> = state
            .items
            .values()
            .filter(|item| {
                matches!(item.sync_state, sync_core::SyncState::Pending | sync_core::SyncState::Downloading { .. })
            })
            .map(|item| item.remote_id.clone())
            .collect();

        run.progress.discovered = outstanding.len() as u64;
        emit(&events_tx, SyncEvent::DiscoveringFiles { files_found: outstanding.len() as u64 }).await;

        for remote_id in &outstanding {
            if cancel.load(Ordering::Relaxed) {
                break;
            }
            self.download_item(wal, state, &events_tx, remote_id, &mut run).await;
        }

        self.finalize_success(wal, state, &events_tx, &cancel, &mut run, started_at_ms).await;
        let _ = wal.flush();
        run
    }

    async fn finalize_success(
        &self,
        wal: &mut Wal,
        state: &mut MaterializedState,
        events_tx: &mpsc::Sender<SyncEvent>,
        cancel: &AtomicBool,
        run: &mut SyncRun,
        started_at_ms: u64,
    ) {
        let now_ms = self.clock.epoch_ms();
        if cancel.load(Ordering::Relaxed) && run.progress.remaining() > 0 {
            // The download loop broke early: items are left
            // `Pending`/`Downloading`, not all processed, so this
            // run did not actually finish — it was interrupted.
            run.interrupt(now_ms);
        } else {
            run.complete(now_ms);
        }
        append(wal, state, StorageEvent::RunFinished { id: run.id.clone(), status: run.status.clone() });
        match run.status {
            sync_core::RunStatus::Interrupted { .. } => {
                emit(events_tx, SyncEvent::Failed { error: "run cancelled before completion".into() }).await;
            }
            _ => {
                emit(
                    events_tx,
                    SyncEvent::Completed {
                        files_processed: run.progress.downloaded + run.progress.failed,
                        bytes_downloaded: run.progress.bytes_downloaded,
                        failed_files: run.progress.failed,
                        duration_ms: now_ms.saturating_sub(started_at_ms),
                    },
                )
                .await;
            }
        }
    }

    /// Returns `Err(message)` only for fatal, listing-level failures.
    /// Per-item failures are recorded on the item and never abort the run.
    async fn reconcile_and_download(
        &self,
        wal: &mut Wal,
        state: &mut MaterializedState,
        events_tx: &mpsc::Sender<SyncEvent>,
        cancel: &AtomicBool,
        run: &mut SyncRun,
    ) -> Result<(), String> {
        let cursor_token = state.cursor(&self.config.remote_root).map(|c| c.token.clone());
        let retry_attempts = self.config.retry_attempts.max(1);
        let retry_base_delay = std::time::Duration::from_secs(self.config.retry_base_delay_secs);
        let jitter_seed = self.clock.epoch_ms();
        let page = retry_exec::with_retry(retry_attempts, retry_base_delay, jitter_seed, || {
            let cursor_token = cursor_token.clone();
            async move { self.driver.list_changes(cursor_token.as_deref()).await }
        })
        .await
        .map_err(|e| e.to_string())?;

        let now_ms = self.clock.epoch_ms();
        let outcome = Reconciler::reconcile_page(
            state,
            &page,
            &self.config.sync_root,
            self.config.delete_propagation,
            &self.config.export_formats,
            now_ms,
        );

        emit(events_tx, SyncEvent::DiscoveringFiles { files_found: outcome.discovered as u64 }).await;

        if outcome.skipped_deletions > 0 {
            tracing::info!(count = outcome.skipped_deletions, "deletions skipped (propagation disabled)");
        }

        let mut queued_remote_ids = Vec::new();
        for event in &outcome.events {
            match event {
                StorageEvent::ItemUpserted { item } => {
                    if matches!(item.kind, ItemKind::File | ItemKind::Exported) {
                        queued_remote_ids.push(item.remote_id.clone());
                        emit(
                            events_tx,
                            SyncEvent::FileQueued {
                                remote_id: item.remote_id.clone(),
                                remote_path: item.remote_path.clone(),
                                size_bytes: Some(item.size_bytes),
                            },
                        )
                        .await;
                    }
                    append(wal, state, event.clone());
                }
                StorageEvent::ItemDeleted { id } => {
                    let materialized = state.items.get(id).map(|item| (item.local_path.clone(), item.kind));
                    append(wal, state, event.clone());
                    if let Some((local_path, kind)) = materialized {
                        if let Err(e) = remove_materialized(&local_path, kind) {
                            tracing::warn!(path = %local_path.display(), error = %e, "failed to remove materialized item");
                        }
                    }
                }
                _ => append(wal, state, event.clone()),
            }
        }

        run.progress.discovered = outcome.discovered as u64;

        let cursor = sync_core::ChangeCursor::new(self.config.remote_root.clone(), page.next_cursor, now_ms);
        let cursor_event = StorageEvent::CursorAdvanced { cursor };

        for remote_id in &queued_remote_ids {
            if cancel.load(Ordering::Relaxed) {
                break;
            }
            self.download_item(wal, state, events_tx, remote_id, run).await;
        }

        // The cursor only advances once every item this page implied has
        // been upserted into the store and every queued download has
        // either finished or been left `Pending` by a clean pass through
        // the loop — not when cancellation broke out of that loop early,
        // since the page may still have unprocessed entries this cursor
        // would otherwise skip on the next run.
        if !cancel.load(Ordering::Relaxed) {
            append(wal, state, cursor_event);
        }
        let _ = wal.flush();

        Ok(())
    }

    async fn download_item(
        &self,
        wal: &mut Wal,
        state: &mut MaterializedState,
        events_tx: &mpsc::Sender<SyncEvent>,
        remote_id: &str,
        run: &mut SyncRun,
    ) {
        let Some(item) = state.items.values().find(|i| i.remote_id == remote_id).cloned() else {
            return;
        };

        emit(
            events_tx,
            SyncEvent::FileDownloading {
                remote_id: item.remote_id.clone(),
                remote_path: item.remote_path.clone(),
                bytes_downloaded: 0,
                total_bytes: Some(item.size_bytes),
            },
        )
        .await;

        append(
            wal,
            state,
            StorageEvent::ItemStateChanged {
                id: item.id,
                state: sync_core::SyncState::Downloading { attempt: 1 },
                updated_at_ms: self.clock.epoch_ms(),
            },
        );

        // A streaming driver would report intermediate progress through
        // this callback; the filesystem/fake drivers this engine ships
        // with call it once with the final size, so the total on
        // `DownloadOutcome::Completed` is authoritative either way.
        let outcome = self.downloader.download_one(self.driver.as_ref(), &item, 1, &self.clock, |_| {}).await;
        let now_ms = self.clock.epoch_ms();

        match outcome {
            DownloadOutcome::Completed { checksum: _, bytes_downloaded } => {
                append(
                    wal,
                    state,
                    StorageEvent::ItemStateChanged {
                        id: item.id,
                        state: sync_core::SyncState::Complete { completed_at_ms: now_ms },
                        updated_at_ms: now_ms,
                    },
                );
                run.progress.downloaded += 1;
                run.progress.bytes_downloaded += bytes_downloaded;
                emit(
                    events_tx,
                    SyncEvent::FileCompleted { remote_id: item.remote_id.clone(), remote_path: item.remote_path.clone() },
                )
                .await;
            }
            DownloadOutcome::Failed { error, attempt } => {
                append(
                    wal,
                    state,
                    StorageEvent::ItemStateChanged {
                        id: item.id,
                        state: sync_core::SyncState::Error {
                            message: error.to_string(),
                            failed_at_ms: now_ms,
                            attempt,
                        },
                        updated_at_ms: now_ms,
                    },
                );
                run.progress.failed += 1;
                emit(
                    events_tx,
                    SyncEvent::FileFailed {
                        remote_id: item.remote_id.clone(),
                        remote_path: item.remote_path.clone(),
                        error: error.to_string(),
                    },
                )
                .await;
            }
        }

        append(
            wal,
            state,
            StorageEvent::RunProgressed { id: run.id.clone(), progress: run.progress },
        );
        emit(
            events_tx,
            SyncEvent::Progress {
                files_processed: run.progress.downloaded + run.progress.failed,
                total_files: run.progress.discovered,
                bytes_downloaded: run.progress.bytes_downloaded,
            },
        )
        .await;
    }
}

fn append(wal: &mut Wal, state: &mut MaterializedState, event: StorageEvent) {
    state.apply_event(&event);
    if wal.append(&event).is_ok() && wal.needs_flush() {
        let _ = wal.flush();
    }
}

/// Remove a previously-materialized item's on-disk representation. Called
/// from `reconcile_and_download`'s own event loop when a removal signal
/// propagates to an `ItemDeleted` event, and available to any other
/// caller that applies such an event outside that loop.
pub fn remove_materialized(local_path: &Path, kind: ItemKind) -> std::io::Result<()> {
    file_ops::remove(local_path, kind).map_err(|e| match e {
        crate::file_ops::FileOpsError::Io(io_err) => io_err,
        other => std::io::Error::other(other.to_string()),
    })
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
