// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Alarm id minting

use crate::alarm::AlarmId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Mints ids for newly materialized alarm instances.
///
/// Ids must never repeat within a store's lifetime; the synchronizer
/// attributes instances to tickers purely by id.
pub trait IdGen: Clone + Send + Sync + 'static {
    fn next(&self) -> AlarmId;
}

/// Random v4 UUIDs
#[derive(Clone, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn next(&self) -> AlarmId {
        AlarmId(uuid::Uuid::new_v4().to_string())
    }
}

/// `{prefix}-{n}` ids counting up from 1, shared across clones
#[derive(Clone)]
pub struct SequentialIdGen {
    prefix: Arc<str>,
    counter: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Arc::from(prefix.into()),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Number of ids minted so far
    pub fn minted(&self) -> u64 {
        self.counter.load(Ordering::SeqCst) - 1
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::new("alarm")
    }
}

impl IdGen for SequentialIdGen {
    fn next(&self) -> AlarmId {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        AlarmId(format!("{}-{n}", self.prefix))
    }
}
