// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Black-box specs driving the compiled `sync`/`syncd` binaries end to
//! end, the way a user actually invokes them.

#[path = "support.rs"]
mod support;

mod daemon {
    #[path = "specs/daemon/lifecycle.rs"]
    mod lifecycle;
}

mod cli {
    #[path = "specs/cli/run.rs"]
    mod run;
    #[path = "specs/cli/status.rs"]
    mod status;
}
