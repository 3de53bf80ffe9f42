//! Quiet-hours evaluation.
//!
//! A quiet window is a pair of `HH:MM` local-time boundaries. The window may
//! wrap midnight (`22:00`..`06:00`). Boundaries equal to each other form an
//! empty window, never a whole-day one.

use chrono::{NaiveTime, Timelike};

/// Parse an `HH:MM` boundary into minutes since midnight.
///
/// Malformed input resolves to 0 (midnight) rather than failing. The
/// fail-open policy is intentional and lives only here; callers that want to
/// reject bad boundaries should validate before storing them.
pub fn parse_hhmm_or_midnight(s: &str) -> u32 {
    let mut parts = s.splitn(2, ':');
    let hours = parts.next().and_then(|p| p.trim().parse::<u32>().ok());
    let minutes = parts.next().and_then(|p| p.trim().parse::<u32>().ok());
    match (hours, minutes) {
        (Some(h), Some(m)) => h * 60 + m,
        _ => 0,
    }
}

/// Whether `time` falls inside the quiet window `[start, end)`.
///
/// `start > end` means the window wraps midnight. `start == end` is empty.
pub fn is_quiet_time(time: NaiveTime, start: &str, end: &str) -> bool {
    let current = time.hour() * 60 + time.minute();
    let start = parse_hhmm_or_midnight(start);
    let end = parse_hhmm_or_midnight(end);

    if start > end {
        // Window wraps midnight, e.g. 22:00-06:00.
        current >= start || current < end
    } else {
        start <= current && current < end
    }
}
