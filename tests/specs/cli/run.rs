// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sync run` / `sync failed-files` specs, driven through `sync`'s
//! `connect_or_start` path (no daemon pre-started by the test).

use crate::support::{success_stdout, Project};

#[test]
fn run_with_no_remote_files_completes_immediately() {
    let project = Project::new();
    let stdout = success_stdout(&mut project.sync().args(["run", "--watch"]));
    assert!(stdout.contains("Sync run started"));
    assert!(stdout.contains("completed"), "empty run should still reach a terminal event: {stdout}");
}

#[test]
fn run_downloads_a_file_from_the_remote_root() {
    let project = Project::new();
    project.remote_file("report.csv", "a,b,c\n1,2,3\n");

    let stdout = success_stdout(&mut project.sync().args(["run", "--watch"]));
    assert!(stdout.contains("completed"), "run should complete: {stdout}");

    let materialized = project.materialized_file("report.csv");
    assert!(materialized.exists(), "report.csv should be downloaded into the sync root");
    assert_eq!(std::fs::read_to_string(materialized).unwrap(), "a,b,c\n1,2,3\n");
}

#[test]
fn resync_flag_is_accepted_and_starts_a_run() {
    let project = Project::new();
    let stdout = success_stdout(&mut project.sync().args(["run", "--resync", "--watch"]));
    assert!(stdout.contains("Sync run started"));
}

#[test]
fn failed_files_reports_none_when_nothing_has_failed() {
    let project = Project::new();
    success_stdout(&mut project.sync().args(["run", "--watch"]));

    let stdout = success_stdout(&mut project.sync().args(["failed-files"]));
    assert!(stdout.contains("No failed files."));
}

#[test]
fn failed_files_reports_not_running_without_a_daemon() {
    let project = Project::new();
    let stdout = success_stdout(&mut project.sync().args(["failed-files"]));
    assert!(stdout.contains("Daemon is not running"));
}
