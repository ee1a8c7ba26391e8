// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::boot_daemon;
use serial_test::serial;

#[tokio::test]
#[serial]
async fn reports_not_running_when_no_daemon_is_listening() {
    let tmp = tempfile::tempdir().unwrap();
    std::env::set_var("XDG_STATE_HOME", tmp.path());

    assert!(handle(OutputFormat::Text).await.is_ok());
}

#[tokio::test]
#[serial]
async fn lists_no_failed_files_against_a_fresh_daemon() {
    let _daemon = boot_daemon().await;
    assert!(handle(OutputFormat::Text).await.is_ok());
}
