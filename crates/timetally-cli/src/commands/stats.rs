use chrono::{NaiveDate, Utc};
use clap::Subcommand;

use timetally_core::clock;
use timetally_core::format;
use timetally_core::session::current_activity;
use timetally_core::stats::{day_timeline, user_summary, window_totals, StatsWindow};
use timetally_core::storage::Database;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's totals
    Today,
    /// Trailing 7 days
    Week,
    /// Trailing 30 days
    Month,
    /// Trailing 365 days
    Year,
    /// Rolling 24 hours
    Last24h,
    /// Half-hour timeline for one day
    Timeline {
        /// Day as YYYY-MM-DD, default today
        date: Option<String>,
    },
    /// Headline numbers
    Summary,
}

pub fn run(user: i64, action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let now = Utc::now();
    let tz = clock::resolve_tz(&db.timezone(user)?, clock::DEFAULT_TZ);

    let (window, title) = match action {
        StatsAction::Today => (StatsWindow::Today, "Today"),
        StatsAction::Week => (StatsWindow::Days(7), "Last 7 days"),
        StatsAction::Month => (StatsWindow::Days(30), "Last 30 days"),
        StatsAction::Year => (StatsWindow::Days(365), "Last 365 days"),
        StatsAction::Last24h => (StatsWindow::Rolling24h, "Last 24 hours"),
        StatsAction::Timeline { date } => return timeline(&db, user, tz, date, now),
        StatsAction::Summary => return summary(&db, user, now),
    };

    let totals = window_totals(&db, user, window, tz, now)?;
    if totals.is_empty() {
        println!("{title}: no data");
        return Ok(());
    }

    let running = current_activity(&db, user)?.map(|open| open.activity);

    println!("{title}:");
    let mut total = 0;
    for (activity, secs) in &totals {
        let marker = if running == Some(*activity) { " ⏱" } else { "" };
        println!(
            "  {} {}: {}{}",
            activity.emoji(),
            activity.name(),
            format::format_words(*secs),
            marker
        );
        total += secs;
    }
    println!("📈 Total: {}", format::format_words(total));
    Ok(())
}

fn timeline(
    db: &Database,
    user: i64,
    tz: chrono_tz::Tz,
    date: Option<String>,
    now: chrono::DateTime<Utc>,
) -> Result<(), Box<dyn std::error::Error>> {
    let date = match date {
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")?,
        None => now.with_timezone(&tz).date_naive(),
    };

    let timeline = day_timeline(db, user, tz, date, now)?;
    println!("{date}:");
    let mut any = false;
    for (index, slot) in timeline.buckets.iter().enumerate() {
        if let Some(slot) = slot {
            any = true;
            println!(
                "  {}  {} {}  {}",
                timetally_core::stats::DayTimeline::bucket_label(index),
                slot.activity.symbol(),
                slot.activity.name(),
                format::format_words(slot.seconds)
            );
        }
    }
    if !any {
        println!("  no data");
    }
    Ok(())
}

fn summary(
    db: &Database,
    user: i64,
    now: chrono::DateTime<Utc>,
) -> Result<(), Box<dyn std::error::Error>> {
    let summary = user_summary(db, user, now)?;
    println!("Sessions: {}", summary.total_sessions);
    println!("Tracked: {}", format::format_words(summary.total_seconds));
    for (activity, count) in &summary.top_activities {
        println!("  {} {}: {} sessions", activity.emoji(), activity.name(), count);
    }
    Ok(())
}
