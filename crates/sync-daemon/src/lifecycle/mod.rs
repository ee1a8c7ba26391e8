// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, recovery.

mod reconcile;
mod startup;

pub(crate) use reconcile::trigger_run;
pub use reconcile::{resume_unfinished, run_poll_loop};
pub use startup::startup;

use std::fs::File;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use parking_lot::Mutex;
use std::time::Instant;

use sync_adapters::{DesktopNotifyAdapter, NotifyAdapter};
use sync_core::{Clock, RunId};
use sync_engine::RemoteDriver;
use sync_storage::{MaterializedState, Wal};
use sync_wire::SyncEvent;
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Daemon configuration: fixed filesystem layout plus the engine
/// configuration it drives.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. `~/.local/state/sync`).
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    pub lock_path: PathBuf,
    pub version_path: PathBuf,
    pub log_path: PathBuf,
    pub wal_path: PathBuf,
    pub snapshot_path: PathBuf,
    /// Engine-level configuration (sync root, remote root, concurrency,
    /// poll interval, delete propagation, notifications).
    pub sync_config: sync_core::Config,
}

impl Config {
    /// Load the fixed daemon layout under [`sync_core::Config::state_dir`],
    /// paired with the given engine configuration.
    pub fn load(sync_config: sync_core::Config) -> Result<Self, LifecycleError> {
        let state_dir = sync_core::Config::state_dir().map_err(|_| LifecycleError::NoStateDir)?;

        Ok(Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            version_path: state_dir.join("daemon.version"),
            log_path: state_dir.join("daemon.log"),
            wal_path: state_dir.join("wal").join("events.wal"),
            snapshot_path: state_dir.join("snapshot.json"),
            state_dir,
            sync_config,
        })
    }
}

/// Daemon state during operation, shared between the poll loop and every
/// IPC connection.
pub struct DaemonState<D: RemoteDriver, C: Clock = sync_core::SystemClock, N: NotifyAdapter = DesktopNotifyAdapter> {
    pub config: Config,
    // Held only to maintain the exclusive file lock; released on drop.
    #[allow(dead_code)]
    lock_file: File,
    pub state: Arc<Mutex<MaterializedState>>,
    pub wal: Arc<Mutex<Wal>>,
    pub driver: Arc<D>,
    pub clock: C,
    pub notifier: N,
    /// Set by `Request::Cancel`, checked by the in-flight run between
    /// items; cleared before the next run starts.
    pub cancel: Arc<AtomicBool>,
    /// Set by `Request::Shutdown`; the poll loop exits after its current
    /// run (if any) finishes.
    pub shutting_down: Arc<AtomicBool>,
    /// Set for the span between a `trigger_run` call claiming the right
    /// to start and `current_run` being populated with the real id,
    /// closing the race where two `Request::Run`s land before either has
    /// a `RunId` to check against.
    pub run_pending: Arc<AtomicBool>,
    /// Id of the run currently in progress, if any.
    pub current_run: Arc<Mutex<Option<RunId>>>,
    /// Fan-out source for `Request::Watch` subscribers. Lossy under lag,
    /// same as the per-run `mpsc` channel it is fed from — a slow
    /// watcher falls behind, it does not block the sync.
    pub events_tx: broadcast::Sender<SyncEvent>,
    pub start_time: Instant,
}

/// Result of daemon startup: the daemon state plus the listener to serve.
pub struct StartupResult<D: RemoteDriver, C: Clock = sync_core::SystemClock, N: NotifyAdapter = DesktopNotifyAdapter> {
    pub daemon: Arc<DaemonState<D, C, N>>,
    pub listener: UnixListener,
    /// Set when replay found items left `Pending`/`Downloading` by a run
    /// that never finished — the caller should kick off
    /// [`reconcile::resume_unfinished`] once it's done wiring up the
    /// rest of the daemon.
    pub has_unfinished_items: bool,
}

impl<D: RemoteDriver, C: Clock, N: NotifyAdapter> DaemonState<D, C, N> {
    /// Flush the WAL, write a final snapshot, and remove the lock/socket/
    /// version files. Agent-equivalent state (tracked items) survives on
    /// disk across daemon restarts; only the lock it's holding is released
    /// here.
    pub fn shutdown(&self) -> Result<(), LifecycleError> {
        info!("shutting down daemon");

        if let Err(e) = self.wal.lock().flush() {
            warn!("failed to flush WAL on shutdown: {e}");
        }

        let processed_seq = self.wal.lock().processed_seq();
        if processed_seq > 0 {
            let state_clone = self.state.lock().clone();
            let checkpointer = sync_storage::Checkpointer::new(self.config.snapshot_path.clone());
            match checkpointer.checkpoint_sync(processed_seq, &state_clone) {
                Ok(result) => info!(seq = result.seq, size_bytes = result.size_bytes, "saved final shutdown snapshot"),
                Err(e) => warn!("failed to save shutdown snapshot: {e}"),
            }
        }

        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!("failed to remove socket file: {e}");
            }
        }
        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("failed to remove PID file: {e}");
            }
        }
        if self.config.version_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.version_path) {
                warn!("failed to remove version file: {e}");
            }
        }

        info!("daemon shutdown complete");
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine state directory")]
    NoStateDir,

    #[error("failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("wal error: {0}")]
    Wal(#[from] sync_storage::WalError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] sync_storage::SnapshotError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
