// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod passes;
pub mod preview;
pub mod schedule;
pub mod ticker;

use anyhow::bail;
use tk_daemon::{daemon_running, open_runtime, Config, OpenRuntime};

/// Open the runtime for a command that writes state.
///
/// Refuses while tickerd holds the state directory.
pub fn open_exclusive(config: &Config) -> anyhow::Result<OpenRuntime> {
    if daemon_running(config) {
        bail!(
            "tickerd is running in {}; stop it before changing tickers",
            config.state_dir.display()
        );
    }
    tracing::debug!(state_dir = %config.state_dir.display(), "opening state");
    Ok(open_runtime(config, &config.engine()?)?)
}
