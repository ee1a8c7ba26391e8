// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sync-engine: the orchestration layer. [`driver::RemoteDriver`] is the
//! only thing it asks of the outside world; [`reconciler::Reconciler`]
//! turns a driver listing into durable state changes, [`downloader::Downloader`]
//! turns `Pending` items into materialized files through [`file_ops`],
//! and [`controller::SyncController`] ties the two together into one
//! observable [`sync_wire::SyncEvent`]-emitting run.

pub mod controller;
pub mod downloader;
pub mod driver;
pub mod file_ops;
pub mod reconciler;
pub mod retry_exec;

pub use controller::SyncController;
pub use downloader::{DownloadOutcome, Downloader};
pub use driver::{ChangeEntry, ChangePage, ProgressCallback, RemoteDriver, RemoteEntry};
pub use file_ops::FileOpsError;
pub use reconciler::{ReconcileOutcome, Reconciler};
