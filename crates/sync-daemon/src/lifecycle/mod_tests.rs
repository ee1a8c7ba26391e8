// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sync_adapters::FakeDriver;
use sync_core::{Config as SyncConfig, FakeClock};

fn test_config(tmp: &std::path::Path) -> Config {
    let sync_config = SyncConfig::builder().sync_root(tmp.join("sync")).remote_root("").build();
    Config {
        state_dir: tmp.to_path_buf(),
        socket_path: tmp.join("daemon.sock"),
        lock_path: tmp.join("daemon.pid"),
        version_path: tmp.join("daemon.version"),
        log_path: tmp.join("daemon.log"),
        wal_path: tmp.join("wal").join("events.wal"),
        snapshot_path: tmp.join("snapshot.json"),
        sync_config,
    }
}

#[tokio::test]
async fn shutdown_flushes_wal_and_removes_runtime_files() {
    let tmp = tempfile::tempdir().unwrap();
    let config = test_config(tmp.path());
    let driver = Arc::new(FakeDriver::new());

    let startup =
        startup::startup(config, driver, FakeClock::new(), sync_adapters::FakeNotifyAdapter::new()).await.unwrap();
    let daemon = startup.daemon;

    assert!(daemon.config.socket_path.exists());
    assert!(daemon.config.lock_path.exists());
    assert!(daemon.config.version_path.exists());

    daemon.shutdown().unwrap();

    assert!(!daemon.config.socket_path.exists());
    assert!(!daemon.config.lock_path.exists());
    assert!(!daemon.config.version_path.exists());
}

#[test]
#[serial_test::serial]
fn config_load_derives_fixed_layout_under_state_dir() {
    std::env::set_var("XDG_STATE_HOME", "/tmp/sync-daemon-mod-tests-state");
    let sync_config = SyncConfig::builder().build();
    let config = Config::load(sync_config).unwrap();

    assert_eq!(config.socket_path, config.state_dir.join("daemon.sock"));
    assert_eq!(config.lock_path, config.state_dir.join("daemon.pid"));
    assert_eq!(config.wal_path, config.state_dir.join("wal").join("events.wal"));
}
