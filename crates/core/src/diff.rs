// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Value-keyed diff between materialized alarms and target occurrences
//!
//! Instances are matched to targets by exact trigger instant, not by id, so
//! re-running with an unchanged schedule yields an empty diff.

use crate::alarm::AlarmInstance;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Changes needed to move the materialized set to the target set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegenerationDiff {
    /// Current instances whose instant is not a target (or duplicates one already kept)
    pub to_delete: Vec<AlarmInstance>,
    /// Target instants with no current instance, ascending
    pub to_add: Vec<DateTime<Utc>>,
}

impl RegenerationDiff {
    pub fn compute(current: &[AlarmInstance], target: &[DateTime<Utc>]) -> Self {
        let target: BTreeSet<DateTime<Utc>> = target.iter().copied().collect();

        let mut kept = BTreeSet::new();
        let mut to_delete = Vec::new();
        for instance in current {
            // A second instance at an already-kept instant would double-fire
            if target.contains(&instance.fire_at) && kept.insert(instance.fire_at) {
                continue;
            }
            to_delete.push(instance.clone());
        }

        let to_add = target.difference(&kept).copied().collect();

        Self { to_delete, to_add }
    }

    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_add.is_empty()
    }
}

#[cfg(test)]
#[path = "diff_tests.rs"]
mod tests;
