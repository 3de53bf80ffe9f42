//! Duration and interval formatting shared by reminders, stats and the CLI.

/// Clock-style duration: `H:MM:SS` over an hour, `MM:SS` over a minute,
/// `SS sec` below that.
pub fn format_clock(secs: i64) -> String {
    let secs = secs.max(0);
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else if minutes > 0 {
        format!("{minutes:02}:{seconds:02}")
    } else {
        format!("{seconds:02} sec")
    }
}

/// Word-style duration used in stats lines: `"2 h 05 min 03 sec"`.
pub fn format_words(secs: i64) -> String {
    let secs = secs.max(0);
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{hours} h {minutes:02} min {seconds:02} sec")
    } else if minutes > 0 {
        format!("{minutes} min {seconds:02} sec")
    } else {
        format!("{seconds} sec")
    }
}

/// Reminder interval display: `off`, `N sec`, `N min` or `N h`.
pub fn format_interval(secs: i64) -> String {
    if secs == 0 {
        "off".to_string()
    } else if secs < 60 {
        format!("{secs} sec")
    } else if secs < 3600 {
        format!("{} min", secs / 60)
    } else {
        format!("{} h", secs / 3600)
    }
}
