// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Presentation refresh signal
//!
//! Fired after any operation that changed persisted tickers so that views
//! can reload.

use std::sync::Arc;
use tokio::sync::watch;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeRefreshSignal;

/// Fire-and-forget notification that persisted tickers changed
pub trait RefreshSignal: Clone + Send + Sync + 'static {
    fn notify(&self);
}

/// Signal that goes nowhere
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpRefreshSignal;

impl RefreshSignal for NoOpRefreshSignal {
    fn notify(&self) {}
}

/// Signal backed by a watch channel carrying a change generation
#[derive(Clone)]
pub struct ChannelRefreshSignal {
    tx: Arc<watch::Sender<u64>>,
}

impl ChannelRefreshSignal {
    pub fn new() -> (Self, watch::Receiver<u64>) {
        let (tx, rx) = watch::channel(0);
        (Self { tx: Arc::new(tx) }, rx)
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }
}

impl RefreshSignal for ChannelRefreshSignal {
    fn notify(&self) {
        self.tx.send_modify(|generation| *generation += 1);
    }
}
