// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Ticker daemon library: state paths, runtime assembly and lifecycle

pub mod lifecycle;

pub use lifecycle::{
    daemon_running, open_runtime, startup, Config, DaemonRuntime, DaemonState, LifecycleError,
    OpenRuntime, STATE_DIR_ENV,
};
