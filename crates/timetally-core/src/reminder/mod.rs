//! Reminder scheduling.
//!
//! A reminder is due when the user's local wall clock reaches the cached
//! next-fire time for their `(user, interval)` pair. The cache is rebuilt
//! lazily from settings; changing a setting drops the user's entries so the
//! next tick re-anchors at the current time. One background tokio task runs
//! the tick loop for all users.

mod cache;
mod notifier;
mod schedule;
mod scheduler;

pub use cache::{CacheKey, ReminderCache};
pub use notifier::{DeliveryOutcome, Notifier};
pub use schedule::next_fire;
pub use scheduler::{
    reminder_text, ReminderScheduler, ReminderService, SchedulerSettings, TickOutcome,
};
