use timetally_core::storage::Database;

pub fn run(user: i64) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    db.clear_user_data(user)?;
    println!("Tracked data removed, settings reset to defaults");
    Ok(())
}
