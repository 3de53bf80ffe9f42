use chrono::Utc;
use timetally_core::clock;
use timetally_core::format;
use timetally_core::session::{compute_elapsed, current_activity};
use timetally_core::storage::Database;

pub fn run(user: i64) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let now = Utc::now();

    match current_activity(&db, user)? {
        Some(open) => {
            println!(
                "{} {} for {}",
                open.activity.emoji(),
                open.activity.name(),
                format::format_clock(compute_elapsed(open.started_at, now))
            );
        }
        None => println!("No activity running"),
    }

    let tz_name = db.timezone(user)?;
    let tz = clock::resolve_tz(&tz_name, clock::DEFAULT_TZ);
    println!("🕒 {} [{}]", clock::format_local_time(tz, now), tz_name);
    Ok(())
}
