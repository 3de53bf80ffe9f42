//! Windowed per-activity totals.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

use crate::activity::ActivityType;
use crate::clock;
use crate::error::DatabaseError;
use crate::session::compute_elapsed;
use crate::storage::{Database, UserId};

/// An aggregation window, evaluated against the user's wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsWindow {
    /// The current local day, midnight to now.
    Today,
    /// The local day `days` back until now (7 = week, 30 = month, 365 = year).
    Days(u32),
    /// The trailing 24 hours regardless of day boundaries.
    Rolling24h,
}

impl StatsWindow {
    /// `[from, to)` bounds as instants.
    pub fn bounds(&self, tz: Tz, now_utc: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        match self {
            StatsWindow::Today => {
                let today = now_utc.with_timezone(&tz).date_naive();
                (clock::local_midnight_utc(tz, today), now_utc)
            }
            StatsWindow::Days(days) => {
                let today = now_utc.with_timezone(&tz).date_naive();
                let from_date = today - Duration::days(i64::from(*days));
                (clock::local_midnight_utc(tz, from_date), now_utc)
            }
            StatsWindow::Rolling24h => (now_utc - Duration::hours(24), now_utc),
        }
    }
}

/// Per-activity totals in seconds for sessions *starting* inside the window,
/// the open session's live elapsed time included. Sorted by total,
/// descending.
pub fn window_totals(
    db: &Database,
    user: UserId,
    window: StatsWindow,
    tz: Tz,
    now_utc: DateTime<Utc>,
) -> Result<Vec<(ActivityType, i64)>, DatabaseError> {
    let (from, to) = window.bounds(tz, now_utc);

    let mut totals: HashMap<ActivityType, i64> =
        db.closed_totals(user, from, to)?.into_iter().collect();

    if let Some(open) = db.open_session(user)? {
        if open.started_at >= from && open.started_at < to {
            *totals.entry(open.activity).or_insert(0) +=
                compute_elapsed(open.started_at, now_utc);
        }
    }

    let mut out: Vec<(ActivityType, i64)> = totals.into_iter().collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));
    Ok(out)
}

/// The same totals with zero-valued entries merged in for activity types
/// without recorded time, in display order.
pub fn with_zero_entries(totals: &[(ActivityType, i64)]) -> Vec<(ActivityType, i64)> {
    ActivityType::ALL
        .iter()
        .map(|activity| {
            let secs = totals
                .iter()
                .find(|(a, _)| a == activity)
                .map(|(_, s)| *s)
                .unwrap_or(0);
            (*activity, secs)
        })
        .collect()
}

/// Headline numbers for one user.
#[derive(Debug, Clone)]
pub struct UserSummary {
    pub total_sessions: i64,
    /// Closed durations plus the open session's live elapsed time.
    pub total_seconds: i64,
    /// Most frequent activity types with their session counts.
    pub top_activities: Vec<(ActivityType, i64)>,
}

pub fn user_summary(
    db: &Database,
    user: UserId,
    now_utc: DateTime<Utc>,
) -> Result<UserSummary, DatabaseError> {
    let total_sessions = db.session_count(user)?;
    let mut total_seconds = db.total_closed_seconds(user)?;
    if let Some(open) = db.open_session(user)? {
        total_seconds += compute_elapsed(open.started_at, now_utc);
    }
    let top_activities = db.activity_counts(user, 3)?;

    Ok(UserSummary {
        total_sessions,
        total_seconds,
        top_activities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn db() -> Database {
        let db = Database::open_memory().unwrap();
        db.ensure_user(1, None, None, None).unwrap();
        db
    }

    fn at(d: u32, h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, d, h, m, s).unwrap()
    }

    #[test]
    fn open_session_merges_into_closed_totals() {
        let db = db();
        // Closed work session of 1800 s, then an open one started 600 s ago.
        db.insert_open_session(1, ActivityType::Work, at(1, 10, 0, 0))
            .unwrap();
        db.close_and_open(1, at(1, 10, 30, 0), 1800, ActivityType::Work, at(1, 11, 0, 0))
            .unwrap();

        let now = at(1, 11, 10, 0);
        let totals = window_totals(&db, 1, StatsWindow::Today, chrono_tz::UTC, now).unwrap();
        assert_eq!(totals, vec![(ActivityType::Work, 2400)]);
    }

    #[test]
    fn sessions_outside_the_window_are_excluded() {
        let db = db();
        db.insert_open_session(1, ActivityType::Study, at(1, 10, 0, 0))
            .unwrap();
        db.close_and_open(1, at(1, 11, 0, 0), 3600, ActivityType::Work, at(2, 9, 0, 0))
            .unwrap();

        let now = at(2, 10, 0, 0);
        let totals = window_totals(&db, 1, StatsWindow::Today, chrono_tz::UTC, now).unwrap();
        // Yesterday's study session is out; today's open work session counts.
        assert_eq!(totals, vec![(ActivityType::Work, 3600)]);
    }

    #[test]
    fn day_window_follows_the_user_timezone() {
        let db = db();
        // 23:00 UTC on May 31 is already June 1 in Moscow (UTC+3).
        db.insert_open_session(1, ActivityType::Rest, Utc.with_ymd_and_hms(2024, 5, 31, 23, 0, 0).unwrap())
            .unwrap();

        let now = at(1, 6, 0, 0);
        let moscow = window_totals(&db, 1, StatsWindow::Today, chrono_tz::Europe::Moscow, now)
            .unwrap();
        assert_eq!(moscow.len(), 1);

        let utc = window_totals(&db, 1, StatsWindow::Today, chrono_tz::UTC, now).unwrap();
        assert!(utc.is_empty());
    }

    #[test]
    fn multi_day_window_includes_older_starts() {
        let db = db();
        db.insert_open_session(1, ActivityType::Sport, at(1, 10, 0, 0))
            .unwrap();
        db.close_and_open(1, at(1, 11, 0, 0), 3600, ActivityType::Rest, at(3, 12, 0, 0))
            .unwrap();

        let now = at(3, 13, 0, 0);
        let totals = window_totals(&db, 1, StatsWindow::Days(7), chrono_tz::UTC, now).unwrap();
        assert_eq!(totals.len(), 2);
        // Rest is the open session: exactly one hour live.
        assert!(totals.contains(&(ActivityType::Rest, 3600)));
        assert!(totals.contains(&(ActivityType::Sport, 3600)));
    }

    #[test]
    fn zero_entries_cover_the_full_activity_set() {
        let totals = vec![(ActivityType::Work, 100)];
        let merged = with_zero_entries(&totals);
        assert_eq!(merged.len(), ActivityType::ALL.len());
        assert!(merged.contains(&(ActivityType::Work, 100)));
        assert!(merged.contains(&(ActivityType::Sleep, 0)));
    }

    #[test]
    fn summary_counts_live_time() {
        let db = db();
        db.insert_open_session(1, ActivityType::Work, at(1, 10, 0, 0))
            .unwrap();
        db.close_and_open(1, at(1, 10, 30, 0), 1800, ActivityType::Study, at(1, 10, 30, 0))
            .unwrap();

        let summary = user_summary(&db, 1, at(1, 10, 40, 0)).unwrap();
        assert_eq!(summary.total_sessions, 2);
        assert_eq!(summary.total_seconds, 1800 + 600);
    }
}
