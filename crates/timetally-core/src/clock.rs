//! Timezone resolution and user-local time helpers.
//!
//! Users carry an IANA timezone identifier as free text. Anything that does
//! not resolve falls back to the default zone -- the fallback is silent
//! toward the user and lives in exactly one place, [`resolve_tz`], so the
//! policy stays visible and overridable.

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Zone applied when a user has no usable timezone on record.
pub const DEFAULT_TIMEZONE: &str = "Europe/Moscow";

/// The default zone as a handle.
pub const DEFAULT_TZ: Tz = chrono_tz::Europe::Moscow;

/// Resolve an IANA timezone name, falling back to `fallback` on unknown or
/// empty input.
pub fn resolve_tz(name: &str, fallback: Tz) -> Tz {
    match name.parse::<Tz>() {
        Ok(tz) => tz,
        Err(_) => {
            tracing::debug!(zone = name, "unknown timezone, using fallback");
            fallback
        }
    }
}

pub fn is_valid_tz(name: &str) -> bool {
    name.parse::<Tz>().is_ok()
}

/// The instant `now_utc` as a wall-clock time in `tz`.
pub fn local_now(tz: Tz, now_utc: DateTime<Utc>) -> NaiveDateTime {
    now_utc.with_timezone(&tz).naive_local()
}

/// Whole hours east of UTC at the given instant.
pub fn utc_offset_hours(tz: Tz, now_utc: DateTime<Utc>) -> i32 {
    use chrono::Offset;
    now_utc.with_timezone(&tz).offset().fix().local_minus_utc() / 3600
}

/// Map a local wall-clock time in `tz` back to an instant.
///
/// DST ambiguity resolves to the earlier instant; a time skipped by a DST
/// gap is treated as if the zone were UTC.
pub fn local_to_utc(tz: Tz, local: NaiveDateTime) -> DateTime<Utc> {
    use chrono::offset::LocalResult;
    use chrono::TimeZone;
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => Utc.from_utc_datetime(&local),
    }
}

/// The instant at which `date` begins in `tz`.
pub fn local_midnight_utc(tz: Tz, date: chrono::NaiveDate) -> DateTime<Utc> {
    local_to_utc(tz, date.and_time(chrono::NaiveTime::MIN))
}

/// `"HH:MM (UTC+3)"`-style display of a user's current wall clock.
pub fn format_local_time(tz: Tz, now_utc: DateTime<Utc>) -> String {
    let local = now_utc.with_timezone(&tz);
    let offset = utc_offset_hours(tz, now_utc);
    let sign = if offset >= 0 { "+" } else { "" };
    format!("{} (UTC{sign}{offset})", local.format("%H:%M"))
}
