// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Starting a sync run, whether from the poll loop or an on-demand
//! `Request::Run`.

use super::DaemonState;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use sync_core::{ChangeCursor, Clock, RunId};
use sync_engine::RemoteDriver;
use sync_storage::StorageEvent;
use sync_wire::SyncEvent;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Channel depth between a run and its event forwarders. Lifecycle
/// events block on send (see `sync_engine::controller::emit`); this
/// only needs to absorb the progress events a fast downloader pool can
/// burst out between a slow watcher's polls.
const RUN_EVENTS_CHANNEL_CAPACITY: usize = 64;

/// Start a run unless one is already in progress. Returns the new run's
/// id as soon as it's known — not when the run finishes — by reading
/// the first (always `SyncEvent::Started`) event off the run's channel
/// inline and re-publishing it to `daemon.events_tx` before handing the
/// rest of the stream off to a background forwarder.
pub(crate) async fn trigger_run<D, C, N>(
    daemon: &Arc<DaemonState<D, C, N>>,
    is_resync: bool,
) -> Result<RunId, String>
where
    D: RemoteDriver,
    C: Clock,
    N: sync_adapters::NotifyAdapter,
{
    if daemon.run_pending.swap(true, Ordering::SeqCst) {
        return Err("a sync run is already in progress".to_string());
    }
    if daemon.current_run.lock().is_some() {
        daemon.run_pending.store(false, Ordering::SeqCst);
        return Err("a sync run is already in progress".to_string());
    }

    daemon.cancel.store(false, Ordering::SeqCst);

    if is_resync {
        let now_ms = daemon.clock.epoch_ms();
        let cursor = ChangeCursor::new(daemon.config.sync_config.remote_root.clone(), String::new(), now_ms);
        let mut wal = daemon.wal.lock();
        let mut state = daemon.state.lock();
        let event = StorageEvent::CursorAdvanced { cursor };
        state.apply_event(&event);
        if wal.append(&event).is_ok() {
            let _ = wal.flush();
        }
    }

    let controller = sync_engine::SyncController::new(
        daemon.config.sync_config.clone(),
        Arc::clone(&daemon.driver),
        daemon.clock.clone(),
    );
    let (tx, mut rx) = mpsc::channel::<SyncEvent>(RUN_EVENTS_CHANNEL_CAPACITY);

    let wal = Arc::clone(&daemon.wal);
    let state = Arc::clone(&daemon.state);
    let cancel = Arc::clone(&daemon.cancel);
    let current_run = Arc::clone(&daemon.current_run);
    let run_pending = Arc::clone(&daemon.run_pending);
    let events_tx = daemon.events_tx.clone();
    let notifier = daemon.notifier.clone();
    let notify_on_completion = daemon.config.sync_config.notify_on_completion;

    tokio::spawn(async move {
        let mut wal = wal.lock();
        let mut state = state.lock();
        let run = controller.run(&mut *wal, &mut *state, tx, cancel).await;
        drop(wal);
        drop(state);

        *current_run.lock() = None;
        run_pending.store(false, Ordering::SeqCst);

        if notify_on_completion {
            let (title, body) = completion_notification(&run.status);
            if let Err(e) = notifier.notify(&title, &body).await {
                warn!("failed to send completion notification: {e}");
            }
        }
    });

    let Some(first) = rx.recv().await else {
        daemon.run_pending.store(false, Ordering::SeqCst);
        return Err("sync run ended before reporting its id".to_string());
    };

    let SyncEvent::Started { run_id, .. } = &first else {
        daemon.run_pending.store(false, Ordering::SeqCst);
        return Err("sync run's first event was not Started".to_string());
    };
    let run_id = RunId::from_string(run_id);
    *daemon.current_run.lock() = Some(run_id.clone());

    let _ = daemon.events_tx.send(first);
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let _ = events_tx.send(event);
        }
    });

    Ok(run_id)
}

/// Re-enter the Downloader for whatever startup found `Pending` or
/// `Downloading`, without listing the remote first. Takes the same
/// `run_pending`/`current_run` slots a normal `trigger_run` would, so an
/// IPC `Request::Run` that lands mid-resume is correctly told a run is
/// already in progress rather than racing it.
pub async fn resume_unfinished<D, C, N>(daemon: Arc<DaemonState<D, C, N>>)
where
    D: RemoteDriver,
    C: Clock,
    N: sync_adapters::NotifyAdapter,
{
    if daemon.run_pending.swap(true, Ordering::SeqCst) {
        warn!("skipping startup resume: a run is already in progress");
        return;
    }

    let controller = sync_engine::SyncController::new(
        daemon.config.sync_config.clone(),
        Arc::clone(&daemon.driver),
        daemon.clock.clone(),
    );
    let (tx, mut rx) = mpsc::channel::<SyncEvent>(RUN_EVENTS_CHANNEL_CAPACITY);

    let wal = Arc::clone(&daemon.wal);
    let state = Arc::clone(&daemon.state);
    let cancel = Arc::clone(&daemon.cancel);
    let current_run = Arc::clone(&daemon.current_run);
    let run_pending = Arc::clone(&daemon.run_pending);
    let events_tx = daemon.events_tx.clone();

    let run_task = tokio::spawn(async move {
        let mut wal = wal.lock();
        let mut state = state.lock();
        let run = controller.resume(&mut wal, &mut state, tx, cancel).await;
        drop(wal);
        drop(state);
        *current_run.lock() = None;
        run_pending.store(false, Ordering::SeqCst);
        run
    });

    let Some(first) = rx.recv().await else {
        let _ = run_task.await;
        return;
    };
    if let SyncEvent::Started { run_id, .. } = &first {
        *daemon.current_run.lock() = Some(RunId::from_string(run_id));
    }
    let _ = events_tx.send(first);
    while let Some(event) = rx.recv().await {
        let _ = events_tx.send(event);
    }

    if let Ok(run) = run_task.await {
        info!(run_id = %run.id, status = %run.status.kind(), "startup resume pass finished");
    }
}

fn completion_notification(status: &sync_core::RunStatus) -> (String, String) {
    match status {
        sync_core::RunStatus::Completed { .. } => ("Sync complete".to_string(), "All files are up to date.".to_string()),
        sync_core::RunStatus::Failed { message, .. } => ("Sync failed".to_string(), message.clone()),
        sync_core::RunStatus::Cancelled { .. } => ("Sync cancelled".to_string(), "The sync run was cancelled.".to_string()),
        sync_core::RunStatus::Interrupted { .. } => {
            ("Sync interrupted".to_string(), "The sync run ended before all files finished downloading.".to_string())
        }
        sync_core::RunStatus::Running => ("Sync".to_string(), "Run ended unexpectedly while still running.".to_string()),
    }
}

/// Drive [`trigger_run`] on `poll_interval_secs`, for as long as the
/// daemon isn't shutting down. A run already in progress (triggered by
/// an IPC `Request::Run`) is left alone; the next tick will simply find
/// nothing to do.
pub(crate) async fn run_poll_loop<D, C, N>(daemon: Arc<DaemonState<D, C, N>>)
where
    D: RemoteDriver,
    C: Clock,
    N: sync_adapters::NotifyAdapter,
{
    let interval = Duration::from_secs(daemon.config.sync_config.poll_interval_secs.max(1));
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if daemon.shutting_down.load(Ordering::SeqCst) {
            return;
        }
        match trigger_run(&daemon, false).await {
            Ok(run_id) => info!(%run_id, "poll-triggered sync run started"),
            Err(message) => {
                if message.contains("already in progress") {
                    info!("skipping poll tick: a run is already in progress");
                } else {
                    error!("poll-triggered sync run failed to start: {message}");
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
