//! Next-fire time computation.
//!
//! Short "test" intervals (under the alignment threshold, 60 s by default)
//! are scheduled relative to now. Intervals up to 30 minutes land on round
//! clock marks (every 15 minutes fires at :00/:15/:30/:45), always strictly
//! in the future. Longer intervals are relative again -- aligning an
//! every-2-hours reminder to the hour grid buys nothing.

use chrono::{Duration, NaiveDateTime, Timelike};

/// Compute the next reminder time after `now_local`.
///
/// `align_threshold_secs` is the boundary below which an interval counts as
/// a test interval (relative scheduling, no clock alignment).
pub fn next_fire(
    now_local: NaiveDateTime,
    interval_secs: i64,
    align_threshold_secs: i64,
) -> NaiveDateTime {
    if interval_secs < align_threshold_secs {
        return now_local + Duration::seconds(interval_secs);
    }

    let interval_min = interval_secs / 60;
    if interval_min >= 1 && interval_min <= 30 {
        // Align to the next multiple of the interval past the hour. A
        // remainder of zero still advances a full interval: the next fire is
        // never "right now".
        let minutes_to_next = interval_min - (now_local.minute() as i64 % interval_min);
        let truncated = now_local
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(now_local);
        truncated + Duration::minutes(minutes_to_next)
    } else {
        now_local + Duration::seconds(interval_secs)
    }
}
