// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup: acquire the exclusive lock, create the state
//! directory layout, replay the WAL on top of the last snapshot, and
//! bind the IPC socket.

use super::{Config, DaemonState, LifecycleError, StartupResult};
use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;
use sync_core::{Clock, RunStatus, SyncState};
use sync_engine::RemoteDriver;
use sync_storage::{load_snapshot, Checkpointer, MaterializedState, StorageEvent, Wal};
use tokio::net::UnixListener;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Buffer size for the `Request::Watch` broadcast channel: a watcher
/// lagging behind by more than this many events drops the oldest ones
/// rather than stalling the run that's producing them.
const EVENTS_BROADCAST_CAPACITY: usize = 256;

/// Acquire the daemon's exclusive lock, load the last snapshot and
/// replay the WAL on top of it, and bind the Unix socket.
///
/// Returns [`LifecycleError::LockFailed`] if another daemon instance
/// already holds `config.lock_path` — the caller should treat that as
/// "already running", not a crash.
pub async fn startup<D, C, N>(
    config: Config,
    driver: Arc<D>,
    clock: C,
    notifier: N,
) -> Result<StartupResult<D, C, N>, LifecycleError>
where
    D: RemoteDriver,
    C: Clock,
    N: sync_adapters::NotifyAdapter,
{
    std::fs::create_dir_all(&config.state_dir)?;
    if let Some(wal_dir) = config.wal_path.parent() {
        std::fs::create_dir_all(wal_dir)?;
    }

    let lock_file = acquire_lock(&config)?;
    std::fs::write(&config.version_path, env!("CARGO_PKG_VERSION"))?;

    let snapshot = load_snapshot(&config.snapshot_path)?;
    let (mut state, snapshot_seq) = match snapshot {
        Some(snap) => {
            info!(seq = snap.seq, "loaded snapshot");
            (snap.state, snap.seq)
        }
        None => (MaterializedState::default(), 0),
    };

    let mut wal = Wal::open(&config.wal_path, snapshot_seq)?;
    let replayed = wal.entries_after(snapshot_seq)?;
    for entry in &replayed {
        state.apply_event(&entry.event);
        wal.mark_processed(entry.seq);
    }
    if !replayed.is_empty() {
        info!(count = replayed.len(), "replayed wal entries since last snapshot");
    }

    // Nothing can legitimately still be `Running` by the time a fresh
    // process reaches this point — the process that owned it either
    // finished the run (which would have flipped the status) or crashed
    // mid-run. Either way the run didn't actually complete, so it's
    // relabeled `Interrupted` and its leftover `Pending`/`Downloading`
    // items become the startup resume pass's work list.
    let stale_run_ids: Vec<_> =
        state.runs.values().filter(|run| matches!(run.status, RunStatus::Running)).map(|r| r.id.clone()).collect();
    if !stale_run_ids.is_empty() {
        let now_ms = clock.epoch_ms();
        for id in &stale_run_ids {
            let event = StorageEvent::RunFinished { id: id.clone(), status: RunStatus::Interrupted { interrupted_at_ms: now_ms } };
            state.apply_event(&event);
            if let Err(e) = wal.append(&event) {
                warn!("failed to record interrupted run {id}: {e}");
            }
        }
        let _ = wal.flush();
        info!(count = stale_run_ids.len(), "marked stale run(s) as interrupted on startup");
    }
    let has_unfinished_items = state
        .items
        .values()
        .any(|item| matches!(item.sync_state, SyncState::Pending | SyncState::Downloading { .. }));

    // A crash between snapshot and WAL truncation leaves the file larger
    // than it needs to be, never corrupt — writing a fresh snapshot here
    // just keeps startup bounded instead of growing unboundedly.
    if wal.write_seq() > snapshot_seq {
        let checkpointer = Checkpointer::new(config.snapshot_path.clone());
        if let Ok(result) = checkpointer.checkpoint_sync(wal.write_seq(), &state) {
            wal.truncate_before(result.seq)?;
        }
    }

    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    let (events_tx, _) = broadcast::channel(EVENTS_BROADCAST_CAPACITY);

    let daemon = Arc::new(DaemonState {
        config,
        lock_file,
        state: Arc::new(Mutex::new(state)),
        wal: Arc::new(Mutex::new(wal)),
        driver,
        clock,
        notifier,
        cancel: Arc::new(AtomicBool::new(false)),
        shutting_down: Arc::new(AtomicBool::new(false)),
        run_pending: Arc::new(AtomicBool::new(false)),
        current_run: Arc::new(Mutex::new(None)),
        events_tx,
        start_time: Instant::now(),
    });

    info!("daemon startup complete");
    Ok(StartupResult { daemon, listener, has_unfinished_items })
}

fn acquire_lock(config: &Config) -> Result<File, LifecycleError> {
    let lock_file = OpenOptions::new()
        .create(true)
        .write(true)
        .open(&config.lock_path)
        .map_err(LifecycleError::LockFailed)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;
    Ok(lock_file)
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
