//! SQLite-based storage for users, activity sessions and settings.
//!
//! Provides persistent storage for:
//! - Users and their timezone / reminder bookkeeping
//! - Activity sessions (open and closed, with computed durations)
//! - Per-user reminder settings
//!
//! The one invariant the schema carries is that at most one activity row per
//! user has a NULL `end_time`. Every write that could disturb it runs inside
//! a transaction, and the close statement targets all open rows for the user
//! so an anomaly left behind by a crash is repaired in passing.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::activity::ActivityType;
use crate::clock;
use crate::error::DatabaseError;

use super::{data_dir, migrations};

pub type UserId = i64;

/// The user's currently running session, if any.
#[derive(Debug, Clone)]
pub struct OpenSession {
    pub id: i64,
    pub activity: ActivityType,
    pub started_at: DateTime<Utc>,
}

/// A session that was closed because another activity started.
#[derive(Debug, Clone)]
pub struct CompletedActivity {
    pub activity: ActivityType,
    pub started_at: DateTime<Utc>,
    pub duration_secs: i64,
}

/// A session row clipped for timeline work; `end` is None while still open.
#[derive(Debug, Clone)]
pub struct SessionSpan {
    pub activity: ActivityType,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct UserRow {
    pub user_id: UserId,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub timezone: String,
    pub last_reminder: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSettings {
    pub reminder_interval: i64,
    pub notifications_enabled: bool,
    pub quiet_time_enabled: bool,
    pub quiet_time_start: String,
    pub quiet_time_end: String,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            reminder_interval: 1800,
            notifications_enabled: true,
            quiet_time_enabled: true,
            quiet_time_start: "22:00".to_string(),
            quiet_time_end: "06:00".to_string(),
        }
    }
}

/// A user whose notifications are on and interval is positive, as returned by
/// [`Database::reminder_candidates`]. Quiet hours and due-ness are evaluated
/// by the scheduler, in the user's own timezone.
#[derive(Debug, Clone)]
pub struct ReminderCandidate {
    pub user_id: UserId,
    pub first_name: String,
    pub timezone: String,
    pub interval_secs: i64,
    pub quiet_enabled: bool,
    pub quiet_start: String,
    pub quiet_end: String,
    pub last_reminder: Option<DateTime<Utc>>,
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::QueryFailed(format!("bad timestamp '{s}': {e}")))
}

fn parse_opt_ts(s: Option<String>) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    s.as_deref().map(parse_ts).transpose()
}

fn parse_activity(tag: &str) -> Result<ActivityType, DatabaseError> {
    tag.parse()
        .map_err(|_| DatabaseError::QueryFailed(format!("unknown activity tag '{tag}'")))
}

/// SQLite database for user, session and settings storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/timetally/timetally.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let path = data_dir()?.join("timetally.db");
        let conn = Connection::open(path)?;
        migrations::migrate(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, Box<dyn std::error::Error>> {
        let conn = Connection::open_in_memory()?;
        migrations::migrate(&conn)?;
        Ok(Self { conn })
    }

    // ── Users ────────────────────────────────────────────────────────

    /// Create the user on first contact, or refresh their display fields.
    ///
    /// A stored timezone is never clobbered here; it only changes through
    /// [`Database::set_timezone`]. Default settings are created alongside.
    pub fn ensure_user(
        &self,
        user_id: UserId,
        username: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO users (user_id, username, first_name, last_name)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_id) DO UPDATE SET
                 username = excluded.username,
                 first_name = excluded.first_name,
                 last_name = excluded.last_name",
            params![user_id, username, first_name, last_name],
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO user_settings (user_id) VALUES (?1)",
            params![user_id],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn user(&self, user_id: UserId) -> Result<Option<UserRow>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, username, first_name, last_name, timezone, last_reminder
             FROM users WHERE user_id = ?1",
        )?;
        let row = stmt.query_row(params![user_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        });
        match row {
            Ok((user_id, username, first_name, last_name, timezone, last_reminder)) => {
                Ok(Some(UserRow {
                    user_id,
                    username,
                    first_name,
                    last_name,
                    timezone,
                    last_reminder: parse_opt_ts(last_reminder)?,
                }))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set_timezone(&self, user_id: UserId, timezone: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE users SET timezone = ?1 WHERE user_id = ?2",
            params![timezone, user_id],
        )?;
        Ok(())
    }

    /// The user's stored timezone, or the default for unknown users.
    pub fn timezone(&self, user_id: UserId) -> Result<String, DatabaseError> {
        let row = self.conn.query_row(
            "SELECT timezone FROM users WHERE user_id = ?1",
            params![user_id],
            |row| row.get::<_, String>(0),
        );
        match row {
            Ok(tz) => Ok(tz),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                Ok(clock::DEFAULT_TIMEZONE.to_string())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, username, first_name, last_name, timezone, last_reminder
             FROM users ORDER BY user_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?;

        let mut users = Vec::new();
        for row in rows {
            let (user_id, username, first_name, last_name, timezone, last_reminder) = row?;
            users.push(UserRow {
                user_id,
                username,
                first_name,
                last_name,
                timezone,
                last_reminder: parse_opt_ts(last_reminder)?,
            });
        }
        Ok(users)
    }

    pub fn set_last_reminder(
        &self,
        user_id: UserId,
        when: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE users SET last_reminder = ?1 WHERE user_id = ?2",
            params![when.to_rfc3339(), user_id],
        )?;
        Ok(())
    }

    // ── Sessions ─────────────────────────────────────────────────────

    pub fn open_session(&self, user_id: UserId) -> Result<Option<OpenSession>, DatabaseError> {
        let row = self.conn.query_row(
            "SELECT id, activity_type, start_time
             FROM activities
             WHERE user_id = ?1 AND end_time IS NULL
             LIMIT 1",
            params![user_id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        );
        match row {
            Ok((id, tag, start)) => Ok(Some(OpenSession {
                id,
                activity: parse_activity(&tag)?,
                started_at: parse_ts(&start)?,
            })),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn insert_open_session(
        &self,
        user_id: UserId,
        activity: ActivityType,
        started_at: DateTime<Utc>,
    ) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO activities (user_id, activity_type, start_time)
             VALUES (?1, ?2, ?3)",
            params![user_id, activity.as_str(), started_at.to_rfc3339()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Close the user's open session(s) and open a new one as a single
    /// logical unit.
    ///
    /// The UPDATE targets every open row for the user rather than a specific
    /// id, which doubles as repair should a crash ever have left more than
    /// one behind.
    pub fn close_and_open(
        &self,
        user_id: UserId,
        end_time: DateTime<Utc>,
        duration_secs: i64,
        new_activity: ActivityType,
        new_start: DateTime<Utc>,
    ) -> Result<i64, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE activities
             SET end_time = ?1, duration_seconds = ?2
             WHERE user_id = ?3 AND end_time IS NULL",
            params![end_time.to_rfc3339(), duration_secs, user_id],
        )?;
        tx.execute(
            "INSERT INTO activities (user_id, activity_type, start_time)
             VALUES (?1, ?2, ?3)",
            params![user_id, new_activity.as_str(), new_start.to_rfc3339()],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(id)
    }

    /// Closed-session totals per activity for sessions *starting* in
    /// `[from, to)`.
    pub fn closed_totals(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<(ActivityType, i64)>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT activity_type, SUM(duration_seconds)
             FROM activities
             WHERE user_id = ?1
               AND start_time >= ?2 AND start_time < ?3
               AND duration_seconds IS NOT NULL
             GROUP BY activity_type",
        )?;
        let rows = stmt.query_map(
            params![user_id, from.to_rfc3339(), to.to_rfc3339()],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
        )?;

        let mut totals = Vec::new();
        for row in rows {
            let (tag, secs) = row?;
            totals.push((parse_activity(&tag)?, secs));
        }
        Ok(totals)
    }

    /// Sessions overlapping `[from, to)`, open session included.
    pub fn sessions_between(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SessionSpan>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT activity_type, start_time, end_time
             FROM activities
             WHERE user_id = ?1
               AND start_time < ?2
               AND (end_time IS NULL OR end_time > ?3)
             ORDER BY start_time",
        )?;
        let rows = stmt.query_map(
            params![user_id, to.to_rfc3339(), from.to_rfc3339()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            },
        )?;

        let mut spans = Vec::new();
        for row in rows {
            let (tag, start, end) = row?;
            spans.push(SessionSpan {
                activity: parse_activity(&tag)?,
                start: parse_ts(&start)?,
                end: parse_opt_ts(end)?,
            });
        }
        Ok(spans)
    }

    pub fn session_count(&self, user_id: UserId) -> Result<i64, DatabaseError> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM activities WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?)
    }

    pub fn total_closed_seconds(&self, user_id: UserId) -> Result<i64, DatabaseError> {
        Ok(self.conn.query_row(
            "SELECT COALESCE(SUM(duration_seconds), 0)
             FROM activities
             WHERE user_id = ?1 AND duration_seconds IS NOT NULL",
            params![user_id],
            |row| row.get(0),
        )?)
    }

    /// The user's most frequent activity types, by session count.
    pub fn activity_counts(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<(ActivityType, i64)>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT activity_type, COUNT(*) as count
             FROM activities
             WHERE user_id = ?1
             GROUP BY activity_type
             ORDER BY count DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = Vec::new();
        for row in rows {
            let (tag, count) = row?;
            counts.push((parse_activity(&tag)?, count));
        }
        Ok(counts)
    }

    // ── Settings ─────────────────────────────────────────────────────

    pub fn settings(&self, user_id: UserId) -> Result<Option<UserSettings>, DatabaseError> {
        let row = self.conn.query_row(
            "SELECT reminder_interval, notifications_enabled,
                    quiet_time_enabled, quiet_time_start, quiet_time_end
             FROM user_settings WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok(UserSettings {
                    reminder_interval: row.get(0)?,
                    notifications_enabled: row.get::<_, i64>(1)? != 0,
                    quiet_time_enabled: row.get::<_, i64>(2)? != 0,
                    quiet_time_start: row.get(3)?,
                    quiet_time_end: row.get(4)?,
                })
            },
        );
        match row {
            Ok(settings) => Ok(Some(settings)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set_reminder_interval(
        &self,
        user_id: UserId,
        interval_secs: i64,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE user_settings SET reminder_interval = ?1 WHERE user_id = ?2",
            params![interval_secs, user_id],
        )?;
        Ok(())
    }

    pub fn set_notifications_enabled(
        &self,
        user_id: UserId,
        enabled: bool,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE user_settings SET notifications_enabled = ?1 WHERE user_id = ?2",
            params![enabled as i64, user_id],
        )?;
        Ok(())
    }

    pub fn set_quiet_enabled(&self, user_id: UserId, enabled: bool) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE user_settings SET quiet_time_enabled = ?1 WHERE user_id = ?2",
            params![enabled as i64, user_id],
        )?;
        Ok(())
    }

    pub fn set_quiet_window(
        &self,
        user_id: UserId,
        start: &str,
        end: &str,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "UPDATE user_settings SET quiet_time_start = ?1, quiet_time_end = ?2
             WHERE user_id = ?3",
            params![start, end, user_id],
        )?;
        Ok(())
    }

    // ── Reminders ────────────────────────────────────────────────────

    /// Users whose notifications are on and interval is positive. Quiet
    /// hours are deliberately not applied here -- they depend on the user's
    /// local wall clock, which is the scheduler's business.
    pub fn reminder_candidates(&self) -> Result<Vec<ReminderCandidate>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT u.user_id, u.first_name, u.timezone, u.last_reminder,
                    s.reminder_interval, s.quiet_time_enabled,
                    s.quiet_time_start, s.quiet_time_end
             FROM users u
             JOIN user_settings s ON u.user_id = s.user_id
             WHERE s.notifications_enabled = 1 AND s.reminder_interval > 0",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
            ))
        })?;

        let mut candidates = Vec::new();
        for row in rows {
            let (user_id, first_name, timezone, last_reminder, interval, quiet, qs, qe) = row?;
            candidates.push(ReminderCandidate {
                user_id,
                first_name: first_name.unwrap_or_default(),
                timezone,
                interval_secs: interval,
                quiet_enabled: quiet != 0,
                quiet_start: qs,
                quiet_end: qe,
                last_reminder: parse_opt_ts(last_reminder)?,
            });
        }
        Ok(candidates)
    }

    // ── Data clear ───────────────────────────────────────────────────

    /// Delete the user's sessions and reset their settings to defaults.
    /// The user row itself (and its timezone) stays.
    pub fn clear_user_data(&self, user_id: UserId) -> Result<(), DatabaseError> {
        let defaults = UserSettings::default();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM activities WHERE user_id = ?1",
            params![user_id],
        )?;
        tx.execute(
            "UPDATE user_settings
             SET reminder_interval = ?1,
                 notifications_enabled = ?2,
                 quiet_time_enabled = ?3,
                 quiet_time_start = ?4,
                 quiet_time_end = ?5
             WHERE user_id = ?6",
            params![
                defaults.reminder_interval,
                defaults.notifications_enabled as i64,
                defaults.quiet_time_enabled as i64,
                defaults.quiet_time_start,
                defaults.quiet_time_end,
                user_id
            ],
        )?;
        tx.commit()?;
        Ok(())
    }
}
