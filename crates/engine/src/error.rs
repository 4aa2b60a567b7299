// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine runtime

use thiserror::Error;
use tk_adapters::{SchedulerError, StoreError};
use tk_core::{AlarmId, TickerId};

/// Errors that can occur in the runtime
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration for ticker {id}: {reason}")]
    InvalidConfiguration { id: TickerId, reason: String },
    #[error("scheduler query failed: {0}")]
    SchedulerQuery(#[source] SchedulerError),
    #[error("store query failed: {0}")]
    StoreQuery(#[source] StoreError),
    #[error("cancel of alarm {id} failed: {source}")]
    CancelFailure { id: AlarmId, source: SchedulerError },
    #[error("create of alarm {id} failed: {source}")]
    CreateFailure { id: AlarmId, source: SchedulerError },
    #[error("persisting tickers failed: {0}")]
    PersistenceFailure(#[source] StoreError),
    #[error("ticker not found: {0}")]
    TickerNotFound(TickerId),
}

/// Coarse failure class, for callers deciding how to report or retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Not retried; the ticker itself must change
    InvalidConfiguration,
    /// Nothing was mutated
    QueryFailure,
    CancelFailure,
    /// Same-operation creates were rolled back
    CreateFailure,
    /// Scheduler changes stand; the next synchronization heals the store
    PersistenceFailure,
    NotFound,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidConfiguration { .. } => ErrorKind::InvalidConfiguration,
            EngineError::SchedulerQuery(_) | EngineError::StoreQuery(_) => ErrorKind::QueryFailure,
            EngineError::CancelFailure { .. } => ErrorKind::CancelFailure,
            EngineError::CreateFailure { .. } => ErrorKind::CreateFailure,
            EngineError::PersistenceFailure(_) => ErrorKind::PersistenceFailure,
            EngineError::TickerNotFound(_) => ErrorKind::NotFound,
        }
    }
}
