use chrono::Utc;
use timetally_core::activity::ActivityType;
use timetally_core::format;
use timetally_core::session::{compute_elapsed, start_activity, StartOutcome};
use timetally_core::storage::Database;

pub fn run(user: i64, activity: &str) -> Result<(), Box<dyn std::error::Error>> {
    let activity: ActivityType = activity.parse()?;
    let db = Database::open()?;
    db.ensure_user(user, None, None, None)?;

    let now = Utc::now();
    match start_activity(&db, user, activity, now)? {
        StartOutcome::AlreadyRunning { activity, since } => {
            println!(
                "{} {} is already running ({})",
                activity.emoji(),
                activity.name(),
                format::format_clock(compute_elapsed(since, now))
            );
        }
        StartOutcome::Started { completed } => {
            if let Some(done) = completed {
                println!(
                    "{} {} finished after {}",
                    done.activity.emoji(),
                    done.activity.name(),
                    format::format_clock(done.duration_secs)
                );
            }
            println!("{} {} started", activity.emoji(), activity.name());
        }
    }
    Ok(())
}
