//! 30-minute-bucket day timeline.
//!
//! Each session's span is clipped to the local day and cut into half-hour
//! buckets, crediting each bucket with the seconds covered. One activity
//! owns a bucket; if two sessions credit the same bucket the one covering
//! more seconds wins. Under the single-open-session invariant real spans
//! cannot overlap, so the tie-break is defensive only.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::activity::ActivityType;
use crate::clock;
use crate::error::DatabaseError;
use crate::storage::{Database, UserId};

pub const BUCKETS_PER_DAY: usize = 48;
pub const BUCKET_SECS: i64 = 1800;

/// The winning activity in one half-hour bucket and its covered seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketSlot {
    pub activity: ActivityType,
    pub seconds: i64,
}

/// One local day cut into 48 half-hour buckets.
#[derive(Debug, Clone)]
pub struct DayTimeline {
    pub date: NaiveDate,
    pub buckets: [Option<BucketSlot>; BUCKETS_PER_DAY],
}

impl DayTimeline {
    /// `"HH:MM"` label of the bucket at `index`.
    pub fn bucket_label(index: usize) -> String {
        let minutes = index as i64 * 30;
        format!("{:02}:{:02}", minutes / 60, minutes % 60)
    }
}

/// Build the timeline for `date` in the user's zone. The open session is
/// clipped at `now_utc`.
pub fn day_timeline(
    db: &Database,
    user: UserId,
    tz: Tz,
    date: NaiveDate,
    now_utc: DateTime<Utc>,
) -> Result<DayTimeline, DatabaseError> {
    let day_start = clock::local_midnight_utc(tz, date);
    let day_end = clock::local_midnight_utc(tz, date + Duration::days(1));

    let mut buckets = [None; BUCKETS_PER_DAY];
    for span in db.sessions_between(user, day_start, day_end)? {
        let end = span.end.unwrap_or(now_utc);
        credit_span(
            &mut buckets,
            day_start,
            span.activity,
            span.start.max(day_start),
            end.min(day_end),
        );
    }

    Ok(DayTimeline { date, buckets })
}

/// Attribute `[from, to)` to the buckets it covers, `day_start`-relative.
fn credit_span(
    buckets: &mut [Option<BucketSlot>; BUCKETS_PER_DAY],
    day_start: DateTime<Utc>,
    activity: ActivityType,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) {
    if to <= from {
        return;
    }

    let start_off = (from - day_start).num_seconds();
    let end_off = (to - day_start).num_seconds();

    let first = (start_off / BUCKET_SECS).max(0) as usize;
    let last = (((end_off - 1) / BUCKET_SECS) as usize).min(BUCKETS_PER_DAY - 1);

    for (index, slot) in buckets.iter_mut().enumerate().take(last + 1).skip(first) {
        let bucket_start = index as i64 * BUCKET_SECS;
        let bucket_end = bucket_start + BUCKET_SECS;
        let covered = end_off.min(bucket_end) - start_off.max(bucket_start);
        if covered <= 0 {
            continue;
        }
        // Greater covered-seconds wins; an existing equal claim stays.
        match slot {
            Some(existing) if existing.seconds >= covered => {}
            _ => {
                *slot = Some(BucketSlot {
                    activity,
                    seconds: covered,
                })
            }
        }
    }
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

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, h, m, s).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn session_fills_the_buckets_it_covers() {
        let db = db();
        // 10:00 to 11:15 -- two full buckets and half of a third.
        db.insert_open_session(1, ActivityType::Work, at(10, 0, 0))
            .unwrap();
        db.close_and_open(1, at(11, 15, 0), 4500, ActivityType::Rest, at(11, 15, 0))
            .unwrap();

        let timeline =
            day_timeline(&db, 1, chrono_tz::UTC, date(), at(11, 20, 0)).unwrap();

        // 10:00 bucket is index 20.
        assert_eq!(
            timeline.buckets[20],
            Some(BucketSlot {
                activity: ActivityType::Work,
                seconds: 1800
            })
        );
        assert_eq!(
            timeline.buckets[21],
            Some(BucketSlot {
                activity: ActivityType::Work,
                seconds: 1800
            })
        );
        // 11:00-11:30: 900 s of work lose to 900? No -- work covers
        // 11:00-11:15 (900 s), the following open rest session covers
        // 11:15-11:20 (300 s): work keeps the bucket.
        assert_eq!(
            timeline.buckets[22],
            Some(BucketSlot {
                activity: ActivityType::Work,
                seconds: 900
            })
        );
        assert_eq!(timeline.buckets[19], None);
    }

    #[test]
    fn longer_span_wins_a_contested_bucket() {
        let mut buckets = [None; BUCKETS_PER_DAY];
        let day_start = at(0, 0, 0);
        credit_span(
            &mut buckets,
            day_start,
            ActivityType::Work,
            at(10, 0, 0),
            at(10, 10, 0),
        );
        credit_span(
            &mut buckets,
            day_start,
            ActivityType::Study,
            at(10, 10, 0),
            at(10, 30, 0),
        );
        assert_eq!(
            buckets[20],
            Some(BucketSlot {
                activity: ActivityType::Study,
                seconds: 1200
            })
        );
    }

    #[test]
    fn open_session_is_clipped_at_now() {
        let db = db();
        db.insert_open_session(1, ActivityType::Sleep, at(22, 0, 0))
            .unwrap();

        let timeline =
            day_timeline(&db, 1, chrono_tz::UTC, date(), at(22, 40, 0)).unwrap();

        assert_eq!(
            timeline.buckets[44],
            Some(BucketSlot {
                activity: ActivityType::Sleep,
                seconds: 1800
            })
        );
        assert_eq!(
            timeline.buckets[45],
            Some(BucketSlot {
                activity: ActivityType::Sleep,
                seconds: 600
            })
        );
        assert_eq!(timeline.buckets[46], None);
    }

    #[test]
    fn span_outside_the_day_is_clipped() {
        let mut buckets = [None; BUCKETS_PER_DAY];
        let day_start = at(0, 0, 0);
        // Caller clips to the day before crediting; a degenerate range is a
        // no-op.
        credit_span(
            &mut buckets,
            day_start,
            ActivityType::Work,
            at(5, 0, 0),
            at(5, 0, 0),
        );
        assert!(buckets.iter().all(|slot| slot.is_none()));
    }

    #[test]
    fn bucket_labels() {
        assert_eq!(DayTimeline::bucket_label(0), "00:00");
        assert_eq!(DayTimeline::bucket_label(21), "10:30");
        assert_eq!(DayTimeline::bucket_label(47), "23:30");
    }
}
