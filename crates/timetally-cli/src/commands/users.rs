use chrono::Utc;
use timetally_core::clock;
use timetally_core::storage::Database;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let users = db.list_users()?;
    if users.is_empty() {
        println!("No users yet");
        return Ok(());
    }

    let now = Utc::now();
    for user in users {
        let name = user.first_name.as_deref().unwrap_or("-");
        let tz = clock::resolve_tz(&user.timezone, clock::DEFAULT_TZ);
        println!(
            "{:>6}  {:<12} {:<20} {}",
            user.user_id,
            name,
            user.timezone,
            clock::format_local_time(tz, now)
        );
    }
    Ok(())
}
