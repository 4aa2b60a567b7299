// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake refresh signal for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::RefreshSignal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts notifications
#[derive(Clone, Default)]
pub struct FakeRefreshSignal {
    count: Arc<AtomicUsize>,
}

impl FakeRefreshSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl RefreshSignal for FakeRefreshSignal {
    fn notify(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}
