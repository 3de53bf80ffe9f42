//! # Timetally Core Library
//!
//! This library provides the core business logic for the Timetally activity
//! tracker. It implements a CLI-first philosophy where all operations are
//! available via a standalone CLI binary, with any chat frontend being a thin
//! transport layer over the same core library.
//!
//! ## Architecture
//!
//! - **Session Machine**: start/stop transition logic over activity sessions,
//!   enforcing the at-most-one-open-session invariant per user
//! - **Reminder Scheduler**: a per-user next-fire cache plus a cooperative
//!   tokio tick loop honoring quiet hours and per-user timezones
//! - **Storage**: SQLite-based session/settings storage and TOML-based
//!   configuration
//! - **Stats**: windowed totals and a 30-minute-bucket day timeline
//!
//! ## Key Components
//!
//! - [`start_activity`]: Session state transition entry point
//! - [`Database`]: User, session and settings persistence
//! - [`ReminderScheduler`]: Reminder tick loop and next-fire cache
//! - [`Config`]: Application configuration management

pub mod activity;
pub mod clock;
pub mod error;
pub mod format;
pub mod quiet;
pub mod reminder;
pub mod session;
pub mod stats;
pub mod storage;

pub use activity::ActivityType;
pub use error::{ConfigError, CoreError, DatabaseError};
pub use reminder::{
    DeliveryOutcome, Notifier, ReminderCache, ReminderScheduler, ReminderService,
    SchedulerSettings,
};
pub use session::{start_activity, StartOutcome};
pub use storage::{Config, Database, UserId};
