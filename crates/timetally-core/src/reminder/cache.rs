//! Next-fire cache.
//!
//! Keyed by `(user, interval)` so a changed interval never reuses the old
//! entry. Process-local, never persisted.

use chrono::NaiveDateTime;
use std::collections::HashMap;

use crate::storage::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub user_id: UserId,
    pub interval_secs: i64,
}

impl CacheKey {
    pub fn new(user_id: UserId, interval_secs: i64) -> Self {
        Self {
            user_id,
            interval_secs,
        }
    }
}

/// Map from `(user, interval)` to the next-fire time in the user's local
/// wall clock.
#[derive(Debug, Default)]
pub struct ReminderCache {
    entries: HashMap<CacheKey, NaiveDateTime>,
}

impl ReminderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_fire(&self, key: &CacheKey) -> Option<NaiveDateTime> {
        self.entries.get(key).copied()
    }

    pub fn set(&mut self, key: CacheKey, when: NaiveDateTime) {
        self.entries.insert(key, when);
    }

    /// Drop every entry for `user`, whatever interval it was keyed under.
    /// Called when the user's interval or notification setting changes.
    pub fn invalidate_user(&mut self, user: UserId) {
        self.entries.retain(|key, _| key.user_id != user);
    }

    /// Drop entries whose next-fire time is more than `max_age_secs` in the
    /// past -- stale leftovers from disabled or long-gone users.
    pub fn sweep(&mut self, now: NaiveDateTime, max_age_secs: i64) {
        self.entries
            .retain(|_, fire| (now - *fire).num_seconds() <= max_age_secs);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
