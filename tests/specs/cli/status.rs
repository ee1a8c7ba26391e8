// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sync status` specs: text and JSON rendering.

use crate::support::{success_stdout, Project};

#[test]
fn status_json_output_is_valid_and_reports_zero_items_before_any_run() {
    let project = Project::new();
    success_stdout(&mut project.sync().args(["daemon", "start"]));

    let stdout = success_stdout(&mut project.sync().args(["--output", "json", "status"]));
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("status --output json should be valid JSON");

    assert_eq!(parsed["total_items"], 0);
    assert_eq!(parsed["pending_count"], 0);
    assert_eq!(parsed["failed_count"], 0);
    assert!(parsed["last_sync_at_ms"].is_null());
}

#[test]
fn status_text_output_reports_never_before_any_run() {
    let project = Project::new();
    success_stdout(&mut project.sync().args(["daemon", "start"]));

    let stdout = success_stdout(&mut project.sync().args(["status"]));
    assert!(stdout.contains("Last sync: never"));
    assert!(stdout.contains("Failed: 0"));
}

#[test]
fn status_reports_an_item_after_a_completed_run() {
    let project = Project::new();
    project.remote_file("photo.jpg", "not really a photo");
    success_stdout(&mut project.sync().args(["run", "--watch"]));

    let stdout = success_stdout(&mut project.sync().args(["status"]));
    assert!(stdout.contains("Items: 1"));
    assert!(!stdout.contains("Last sync: never"));
}
