// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concrete adapters for the outside world: desktop notifications, a
//! filesystem-backed remote driver, and, behind `test-support`,
//! in-memory fakes for integration tests.

pub mod driver;
pub mod notify;

pub use driver::FilesystemDriver;
pub use notify::{DesktopNotifyAdapter, NotifyAdapter, NotifyError};

#[cfg(any(test, feature = "test-support"))]
pub use driver::FakeDriver;

#[cfg(any(test, feature = "test-support"))]
pub use notify::{FakeNotifyAdapter, NotifyCall};
