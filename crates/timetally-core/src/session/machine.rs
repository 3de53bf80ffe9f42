//! Session transition logic.
//!
//! A user has at most one open session. Starting the activity that is
//! already running changes nothing; starting a different one closes the
//! running session (computing its duration) and opens the new one as a
//! single logical unit.
//!
//! ```text
//! (no session) --start(T)--> open(T)
//! open(T)      --start(T)--> open(T)          # idempotent, reports "already running"
//! open(T)      --start(U)--> open(U)          # closes T with its duration
//! ```

use chrono::{DateTime, Utc};

use crate::activity::ActivityType;
use crate::error::DatabaseError;
use crate::storage::{CompletedActivity, Database, OpenSession, UserId};

/// Result of a start request.
#[derive(Debug, Clone)]
pub enum StartOutcome {
    /// The requested activity was already running; nothing changed.
    AlreadyRunning {
        activity: ActivityType,
        since: DateTime<Utc>,
    },
    /// A new session was opened. `completed` carries the closed prior
    /// session, if there was one.
    Started {
        completed: Option<CompletedActivity>,
    },
}

/// Elapsed whole seconds between `start` and `now`, never negative.
///
/// Truncates sub-second remainder; clock skew that would produce a negative
/// duration clamps to zero.
pub fn compute_elapsed(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - start).num_seconds().max(0)
}

/// Start `activity` for `user` at `now`.
///
/// Closing the prior session and opening the new one happen in one storage
/// transaction, so the at-most-one-open-session invariant holds across
/// crashes and retries.
///
/// # Errors
/// Storage failures surface to the caller unchanged; nothing is retried
/// here.
pub fn start_activity(
    db: &Database,
    user: UserId,
    activity: ActivityType,
    now: DateTime<Utc>,
) -> Result<StartOutcome, DatabaseError> {
    match db.open_session(user)? {
        Some(open) if open.activity == activity => Ok(StartOutcome::AlreadyRunning {
            activity,
            since: open.started_at,
        }),
        Some(open) => {
            let duration = compute_elapsed(open.started_at, now);
            db.close_and_open(user, now, duration, activity, now)?;
            Ok(StartOutcome::Started {
                completed: Some(CompletedActivity {
                    activity: open.activity,
                    started_at: open.started_at,
                    duration_secs: duration,
                }),
            })
        }
        None => {
            db.insert_open_session(user, activity, now)?;
            Ok(StartOutcome::Started { completed: None })
        }
    }
}

/// The user's currently open session, if any. Pure read.
pub fn current_activity(db: &Database, user: UserId) -> Result<Option<OpenSession>, DatabaseError> {
    db.open_session(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn db() -> Database {
        let db = Database::open_memory().unwrap();
        db.ensure_user(1, None, Some("Ann"), None).unwrap();
        db
    }

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, h, m, s).unwrap()
    }

    fn open_rows(db: &Database) -> i64 {
        db.conn()
            .query_row(
                "SELECT COUNT(*) FROM activities WHERE end_time IS NULL",
                [],
                |row| row.get(0),
            )
            .unwrap()
    }

    #[test]
    fn first_start_opens_session() {
        let db = db();
        let outcome = start_activity(&db, 1, ActivityType::Work, at(10, 0, 0)).unwrap();
        assert!(matches!(
            outcome,
            StartOutcome::Started { completed: None }
        ));
        let open = current_activity(&db, 1).unwrap().unwrap();
        assert_eq!(open.activity, ActivityType::Work);
        assert_eq!(open.started_at, at(10, 0, 0));
    }

    #[test]
    fn same_activity_is_idempotent() {
        let db = db();
        start_activity(&db, 1, ActivityType::Work, at(10, 0, 0)).unwrap();
        let outcome = start_activity(&db, 1, ActivityType::Work, at(10, 5, 0)).unwrap();

        match outcome {
            StartOutcome::AlreadyRunning { activity, since } => {
                assert_eq!(activity, ActivityType::Work);
                assert_eq!(since, at(10, 0, 0));
            }
            other => panic!("expected AlreadyRunning, got {other:?}"),
        }

        // Start time unchanged, still exactly one open row.
        let open = current_activity(&db, 1).unwrap().unwrap();
        assert_eq!(open.started_at, at(10, 0, 0));
        assert_eq!(open_rows(&db), 1);
    }

    #[test]
    fn switching_closes_with_duration() {
        let db = db();
        start_activity(&db, 1, ActivityType::Work, at(10, 0, 0)).unwrap();
        let outcome = start_activity(&db, 1, ActivityType::Study, at(10, 30, 15)).unwrap();

        match outcome {
            StartOutcome::Started {
                completed: Some(completed),
            } => {
                assert_eq!(completed.activity, ActivityType::Work);
                assert_eq!(completed.duration_secs, 1815);
            }
            other => panic!("expected Started with completed, got {other:?}"),
        }

        let open = current_activity(&db, 1).unwrap().unwrap();
        assert_eq!(open.activity, ActivityType::Study);
        assert_eq!(open.started_at, at(10, 30, 15));
        assert_eq!(open_rows(&db), 1);
    }

    #[test]
    fn at_most_one_open_session_across_many_switches() {
        let db = db();
        let mut t = at(8, 0, 0);
        for activity in [
            ActivityType::Work,
            ActivityType::Rest,
            ActivityType::Work,
            ActivityType::Sport,
            ActivityType::Sleep,
        ] {
            start_activity(&db, 1, activity, t).unwrap();
            assert_eq!(open_rows(&db), 1);
            t += chrono::Duration::minutes(17);
        }
    }

    #[test]
    fn negative_elapsed_clamps_to_zero() {
        assert_eq!(compute_elapsed(at(10, 0, 0), at(9, 59, 0)), 0);
        assert_eq!(compute_elapsed(at(10, 0, 0), at(10, 0, 0)), 0);
    }

    #[test]
    fn elapsed_truncates_whole_seconds() {
        let start = at(10, 0, 0);
        let now = start + chrono::Duration::milliseconds(1999);
        assert_eq!(compute_elapsed(start, now), 1);
    }

    #[test]
    fn users_are_independent() {
        let db = db();
        db.ensure_user(2, None, Some("Bob"), None).unwrap();
        start_activity(&db, 1, ActivityType::Work, at(10, 0, 0)).unwrap();
        start_activity(&db, 2, ActivityType::Sleep, at(10, 0, 0)).unwrap();
        start_activity(&db, 1, ActivityType::Rest, at(11, 0, 0)).unwrap();

        let bob = current_activity(&db, 2).unwrap().unwrap();
        assert_eq!(bob.activity, ActivityType::Sleep);
        assert_eq!(bob.started_at, at(10, 0, 0));
    }
}
