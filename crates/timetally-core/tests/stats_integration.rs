//! End-to-end stats over a realistic day of activity switches, driven
//! through the session machine rather than raw inserts.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use timetally_core::activity::ActivityType;
use timetally_core::session::start_activity;
use timetally_core::stats::{day_timeline, user_summary, window_totals, StatsWindow};
use timetally_core::storage::Database;

fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, h, m, s).unwrap()
}

fn tracked_day() -> Database {
    let db = Database::open_memory().unwrap();
    db.ensure_user(1, None, Some("Ann"), None).unwrap();
    // 09:00 work, 12:30 rest, 13:00 work again, still running.
    start_activity(&db, 1, ActivityType::Work, at(9, 0, 0)).unwrap();
    start_activity(&db, 1, ActivityType::Rest, at(12, 30, 0)).unwrap();
    start_activity(&db, 1, ActivityType::Work, at(13, 0, 0)).unwrap();
    db
}

#[test]
fn day_totals_merge_live_elapsed() {
    let db = tracked_day();
    let now = at(15, 0, 0);

    let totals = window_totals(&db, 1, StatsWindow::Today, chrono_tz::UTC, now).unwrap();

    // Work: 3.5 h closed + 2 h live; rest: 30 min closed.
    assert_eq!(totals[0], (ActivityType::Work, (3 * 3600 + 1800) + 2 * 3600));
    assert_eq!(totals[1], (ActivityType::Rest, 1800));
}

#[test]
fn rolling_window_sees_what_the_day_window_sees_today() {
    let db = tracked_day();
    let now = at(15, 0, 0);

    let day = window_totals(&db, 1, StatsWindow::Today, chrono_tz::UTC, now).unwrap();
    let rolling = window_totals(&db, 1, StatsWindow::Rolling24h, chrono_tz::UTC, now).unwrap();
    assert_eq!(day, rolling);
}

#[test]
fn timeline_matches_the_switches() {
    let db = tracked_day();
    let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

    let timeline = day_timeline(&db, 1, chrono_tz::UTC, date, at(15, 0, 0)).unwrap();

    // 09:00-12:30 work fills buckets 18..=24; the 12:30 bucket is rest;
    // work owns everything from 13:00 until now.
    assert_eq!(timeline.buckets[18].unwrap().activity, ActivityType::Work);
    assert_eq!(timeline.buckets[24].unwrap().activity, ActivityType::Work);
    assert_eq!(timeline.buckets[25].unwrap().activity, ActivityType::Rest);
    assert_eq!(timeline.buckets[26].unwrap().activity, ActivityType::Work);
    assert_eq!(timeline.buckets[29].unwrap().activity, ActivityType::Work);
    assert!(timeline.buckets[30].is_none());
    assert!(timeline.buckets[17].is_none());
}

#[test]
fn summary_reflects_sessions_and_live_time() {
    let db = tracked_day();
    let summary = user_summary(&db, 1, at(15, 0, 0)).unwrap();

    assert_eq!(summary.total_sessions, 3);
    // 09:00 to 15:00 tracked without gaps.
    assert_eq!(summary.total_seconds, 6 * 3600);
    assert_eq!(summary.top_activities[0].0, ActivityType::Work);
    assert_eq!(summary.top_activities[0].1, 2);
}
