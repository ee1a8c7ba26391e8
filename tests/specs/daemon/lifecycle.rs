// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle specs: start/stop/status against the real `syncd`
//! binary, plus crash recovery across a restart.

use crate::support::{success_stdout, wait_for, Project, SPEC_WAIT_MAX_MS};

#[test]
fn daemon_status_reports_not_running_before_start() {
    let project = Project::new();
    let stdout = success_stdout(&mut project.sync().args(["status"]));
    assert!(stdout.contains("Daemon is not running"));
}

#[test]
fn daemon_start_reports_success() {
    let project = Project::new();
    let stdout = success_stdout(&mut project.sync().args(["daemon", "start"]));
    assert!(stdout.contains("Daemon started"));
}

#[test]
fn starting_an_already_running_daemon_is_a_no_op() {
    let project = Project::new();
    success_stdout(&mut project.sync().args(["daemon", "start"]));
    let stdout = success_stdout(&mut project.sync().args(["daemon", "start"]));
    assert!(stdout.contains("Daemon already running"));
}

#[test]
fn daemon_creates_its_state_files_on_start() {
    let project = Project::new();
    success_stdout(&mut project.sync().args(["daemon", "start"]));

    let state_path = project.state_path();
    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || state_path.join("daemon.sock").exists()),
        "socket file should exist"
    );
    assert!(state_path.join("daemon.pid").exists(), "lock file should exist");
    assert!(state_path.join("daemon.version").exists(), "version file should exist");
}

#[test]
fn daemon_stop_reports_success() {
    let project = Project::new();
    success_stdout(&mut project.sync().args(["daemon", "start"]));
    let stdout = success_stdout(&mut project.sync().args(["daemon", "stop"]));
    assert!(stdout.contains("Daemon stopped"));
}

#[test]
fn daemon_status_reports_not_running_after_stop() {
    let project = Project::new();
    success_stdout(&mut project.sync().args(["daemon", "start"]));
    success_stdout(&mut project.sync().args(["daemon", "stop"]));

    let stdout = success_stdout(&mut project.sync().args(["status"]));
    assert!(stdout.contains("Daemon is not running"));
}

#[test]
fn stopping_a_daemon_that_is_not_running_reports_that() {
    let project = Project::new();
    let stdout = success_stdout(&mut project.sync().args(["daemon", "stop"]));
    assert!(stdout.contains("Daemon not running"));
}

/// A crashed daemon's materialized state survives a restart: items
/// downloaded before the crash are still reported by `sync status`
/// afterwards, recovered from the snapshot plus WAL replay.
#[test]
fn materialized_state_survives_a_daemon_crash_and_restart() {
    let project = Project::new();
    project.remote_file("notes.txt", "hello from the remote");

    let mut child = project.syncd().spawn().expect("syncd should spawn");

    let state_path = project.state_path();
    let daemon_up = wait_for(SPEC_WAIT_MAX_MS, || state_path.join("daemon.sock").exists());
    assert!(daemon_up, "syncd should bind its socket");

    let run_stdout = success_stdout(&mut project.sync().args(["run", "--watch"]));
    assert!(run_stdout.contains("completed"), "run should complete: {run_stdout}");
    assert!(
        project.materialized_file("notes.txt").exists(),
        "the remote file should have been materialized locally"
    );

    // Simulate a crash: no graceful shutdown, no snapshot flush.
    child.kill().expect("should be able to kill syncd");
    child.wait().expect("kill should be observable");

    success_stdout(&mut project.sync().args(["daemon", "start"]));
    let status_stdout = success_stdout(&mut project.sync().args(["status"]));
    assert!(status_stdout.contains("Items: 1"), "recovered status should still report 1 item: {status_stdout}");
}
