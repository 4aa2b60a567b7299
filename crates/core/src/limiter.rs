// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-ticker regeneration cooldown
//!
//! Several triggers (foreground return, background tick, timezone change) can
//! fire close together. The check and the record for a ticker happen under
//! one lock so two triggers cannot both pass [`RateLimiter::try_acquire`].

use crate::clock::Clock;
use crate::ticker::TickerId;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// Cooldown tracker for regeneration runs
pub struct RateLimiter<C: Clock> {
    cooldown: Duration,
    clock: C,
    history: Mutex<HashMap<TickerId, DateTime<Utc>>>,
}

impl<C: Clock> RateLimiter<C> {
    pub fn new(cooldown: Duration, clock: C) -> Self {
        Self {
            cooldown,
            clock,
            history: Mutex::new(HashMap::new()),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    fn remaining(&self, last: Option<&DateTime<Utc>>, now: DateTime<Utc>) -> Duration {
        match last {
            // a cooldown that runs past the calendar never expires
            Some(last) => match last.checked_add_signed(self.cooldown) {
                Some(until) => (until - now).max(Duration::zero()),
                None => Duration::MAX,
            },
            None => Duration::zero(),
        }
    }

    /// Whether a regeneration may run now. `force` always passes and does not
    /// touch the recorded history.
    pub fn can_regenerate(&self, id: &TickerId, force: bool) -> bool {
        if force {
            return true;
        }
        let history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        self.remaining(history.get(id), self.clock.now()) == Duration::zero()
    }

    /// Record that a regeneration ran now
    pub fn record_regeneration(&self, id: &TickerId) {
        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        history.insert(id.clone(), self.clock.now());
    }

    /// Check and record in one critical section.
    ///
    /// Returns true (and starts the cooldown) if the caller may regenerate.
    pub fn try_acquire(&self, id: &TickerId, force: bool) -> bool {
        let now = self.clock.now();
        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        if !force && self.remaining(history.get(id), now) > Duration::zero() {
            return false;
        }
        history.insert(id.clone(), now);
        true
    }

    /// Time left before a non-forced regeneration is allowed; zero if allowed now
    pub fn time_until_next_allowed(&self, id: &TickerId) -> Duration {
        let history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        self.remaining(history.get(id), self.clock.now())
    }

    pub fn clear_history(&self, id: &TickerId) {
        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        history.remove(id);
    }

    pub fn clear_all(&self) {
        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        history.clear();
    }
}

#[cfg(test)]
#[path = "limiter_tests.rs"]
mod tests;
