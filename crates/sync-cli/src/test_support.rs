// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test scaffolding: boots an in-process daemon (`FakeDriver`-backed)
//! bound to a temp-dir socket, so command tests can drive it through the
//! same [`crate::client::DaemonClient`] used against the real `syncd`
//! binary.

use std::sync::Arc;
use sync_adapters::{FakeDriver, FakeNotifyAdapter};
use sync_core::{Config as SyncConfig, FakeClock};
use sync_daemon::lifecycle::{self, Config};

/// Keeps the temp directory alive for the test's duration; the daemon's
/// socket path is derived from `XDG_STATE_HOME`, which this sets.
pub struct TestDaemon {
    #[allow(dead_code)]
    pub tmp: tempfile::TempDir,
}

pub async fn boot_daemon() -> TestDaemon {
    let tmp = tempfile::tempdir().unwrap();
    std::env::set_var("XDG_STATE_HOME", tmp.path());
    let state_dir = tmp.path().join("sync");

    let sync_config =
        SyncConfig::builder().sync_root(tmp.path().join("files")).remote_root("").build();
    let config = Config {
        socket_path: state_dir.join("daemon.sock"),
        lock_path: state_dir.join("daemon.pid"),
        version_path: state_dir.join("daemon.version"),
        log_path: state_dir.join("daemon.log"),
        wal_path: state_dir.join("wal").join("events.wal"),
        snapshot_path: state_dir.join("snapshot.json"),
        state_dir,
        sync_config,
    };

    let result = lifecycle::startup(
        config,
        Arc::new(FakeDriver::new()),
        FakeClock::new(),
        FakeNotifyAdapter::new(),
    )
    .await
    .unwrap();
    let daemon = result.daemon;
    tokio::spawn(sync_daemon::socket::serve(result.listener, daemon));

    TestDaemon { tmp }
}
