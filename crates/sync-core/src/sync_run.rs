// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `SyncRun` data model: one end-to-end orchestration of reconcile +
//! download, owned by [`SyncController`](crate).

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Identifier for a single sync run. Monotonically increasing in
    /// creation order within a [`MetaStore`](crate) — callers needing a
    /// strict ordering should sort by `started_at_ms`, not by `RunId`
    /// text, since the id itself carries no ordering guarantee.
    pub struct RunId("run-");
}

/// Data-carrying status for a [`SyncRun`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed { completed_at_ms: u64 },
    Failed { message: String, failed_at_ms: u64 },
    Cancelled { cancelled_at_ms: u64 },
    /// The process exited (or cancellation broke the download loop) while
    /// this run was still `Running`, with items left in `Pending` or
    /// `Downloading`. Distinct from `Cancelled`, which no production path
    /// currently produces — `Interrupted` is what a crash or an
    /// in-flight `Cancel` request actually leaves behind, and is what the
    /// next startup's resume pass looks for.
    Interrupted { interrupted_at_ms: u64 },
}

impl RunStatus {
    pub fn kind(&self) -> RunStatusKind {
        RunStatusKind::from(self)
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

/// Tag-only counterpart of [`RunStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatusKind {
    Running,
    Completed,
    Failed,
    Cancelled,
    Interrupted,
}

crate::simple_display! {
    RunStatusKind {
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
        Interrupted => "interrupted",
    }
}

impl From<&RunStatus> for RunStatusKind {
    fn from(status: &RunStatus) -> Self {
        match status {
            RunStatus::Running => RunStatusKind::Running,
            RunStatus::Completed { .. } => RunStatusKind::Completed,
            RunStatus::Failed { .. } => RunStatusKind::Failed,
            RunStatus::Cancelled { .. } => RunStatusKind::Cancelled,
            RunStatus::Interrupted { .. } => RunStatusKind::Interrupted,
        }
    }
}

/// Running totals for a [`SyncRun`], updated as the Downloader pool
/// drains.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunProgress {
    pub discovered: u64,
    pub downloaded: u64,
    pub failed: u64,
    pub skipped: u64,
    pub bytes_downloaded: u64,
}

impl RunProgress {
    pub fn remaining(&self) -> u64 {
        self.discovered.saturating_sub(self.downloaded + self.failed + self.skipped)
    }
}

/// One end-to-end orchestration of reconcile + download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRun {
    pub id: RunId,
    pub status: RunStatus,
    pub progress: RunProgress,
    pub started_at_ms: u64,
}

impl SyncRun {
    pub fn new(id: RunId, started_at_ms: u64) -> Self {
        Self { id, status: RunStatus::Running, progress: RunProgress::default(), started_at_ms }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn complete(&mut self, now_ms: u64) {
        if !self.is_terminal() {
            self.status = RunStatus::Completed { completed_at_ms: now_ms };
        }
    }

    pub fn fail(&mut self, message: String, now_ms: u64) {
        if !self.is_terminal() {
            self.status = RunStatus::Failed { message, failed_at_ms: now_ms };
        }
    }

    pub fn cancel(&mut self, now_ms: u64) {
        if !self.is_terminal() {
            self.status = RunStatus::Cancelled { cancelled_at_ms: now_ms };
        }
    }

    /// Marks the run as having ended while work was still outstanding,
    /// either because the process is about to exit with items left in
    /// `Pending`/`Downloading`, or because a cancellation request broke
    /// the download loop before it drained.
    pub fn interrupt(&mut self, now_ms: u64) {
        if !self.is_terminal() {
            self.status = RunStatus::Interrupted { interrupted_at_ms: now_ms };
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct SyncRunBuilder => SyncRun {
        computed { id: RunId = RunId::new() }
        set { status: RunStatus = RunStatus::Running }
        set { progress: RunProgress = RunProgress::default() }
        set { started_at_ms: u64 = 0 }
    }
}

#[cfg(test)]
#[path = "sync_run_tests.rs"]
mod tests;
