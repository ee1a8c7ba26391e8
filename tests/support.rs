// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixture for the workspace's black-box specs: a temp project
//! with its own sync root / "remote" directory / state dir, talking to
//! the real `sync`/`syncd` binaries via `assert_cmd`.

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Upper bound for `wait_for` loops. Generous because CI runners are
/// slower than a dev laptop, not because anything here is expected to
/// take this long in practice.
pub const SPEC_WAIT_MAX_MS: u64 = 5_000;

/// Poll `cond` until it returns `true` or `max_ms` elapses.
pub fn wait_for(max_ms: u64, mut cond: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    loop {
        if cond() {
            return true;
        }
        if start.elapsed() > Duration::from_millis(max_ms) {
            return false;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

/// A throwaway project: a local sync root, a directory standing in for
/// the remote drive, and an isolated `XDG_STATE_HOME` so daemons from
/// different tests never share a socket or lock file.
pub struct Project {
    _tmp: TempDir,
    sync_root: PathBuf,
    remote_root: PathBuf,
    xdg_state_home: PathBuf,
    config_path: PathBuf,
}

impl Project {
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().expect("create temp project dir");
        let sync_root = tmp.path().join("local");
        let remote_root = tmp.path().join("remote");
        let xdg_state_home = tmp.path().join("xdg_state");
        std::fs::create_dir_all(&sync_root).unwrap();
        std::fs::create_dir_all(&remote_root).unwrap();
        std::fs::create_dir_all(&xdg_state_home).unwrap();

        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            format!(
                "sync_root = {:?}\nremote_root = {:?}\npoll_interval_secs = 1\n",
                sync_root, remote_root,
            ),
        )
        .unwrap();

        Self { _tmp: tmp, sync_root, remote_root, xdg_state_home, config_path }
    }

    /// State directory the daemon actually writes to: `state_dir()`
    /// joins `sync` onto `XDG_STATE_HOME`.
    pub fn state_path(&self) -> PathBuf {
        self.xdg_state_home.join("sync")
    }

    pub fn remote_root(&self) -> &Path {
        &self.remote_root
    }

    pub fn sync_root(&self) -> &Path {
        &self.sync_root
    }

    fn apply_env(&self, cmd: &mut Command) {
        cmd.env("XDG_STATE_HOME", &self.xdg_state_home);
        cmd.env("SYNC_CONFIG_PATH", &self.config_path);
    }

    /// A `sync` invocation with this project's environment applied.
    pub fn sync(&self) -> Command {
        let mut cmd = Command::cargo_bin("sync").expect("sync binary should build");
        self.apply_env(&mut cmd);
        cmd
    }

    /// A `syncd` invocation, for tests that need to hold the `Child`
    /// handle directly (e.g. to `kill()` it and simulate a crash)
    /// rather than going through `sync daemon start`'s spawn-and-poll.
    pub fn syncd(&self) -> Command {
        let mut cmd = Command::cargo_bin("syncd").expect("syncd binary should build");
        self.apply_env(&mut cmd);
        cmd
    }

    /// Write a file under the remote root, as if a peer device had
    /// uploaded it.
    pub fn remote_file(&self, relative: &str, contents: &str) {
        let path = self.remote_root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    pub fn materialized_file(&self, relative: &str) -> PathBuf {
        self.sync_root.join(relative)
    }
}

/// Run `cmd`, assert it exits successfully, and return its stdout.
pub fn success_stdout(cmd: &mut Command) -> String {
    let assert = cmd.assert().success();
    String::from_utf8_lossy(&assert.get_output().stdout).into_owned()
}

/// Run `cmd`, assert it exits with a failure code, and return its stderr.
pub fn failure_stderr(cmd: &mut Command) -> String {
    let assert = cmd.assert().failure();
    String::from_utf8_lossy(&assert.get_output().stderr).into_owned()
}
