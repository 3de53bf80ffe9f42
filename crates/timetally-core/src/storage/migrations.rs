//! Database schema migrations for timetally.
//!
//! Migrations are versioned and applied automatically when opening the
//! database. The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Apply all pending migrations to bring the database to the current schema
/// version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }
    if current_version < 3 {
        migrate_v3(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            0
        } else {
            eprintln!("Warning: failed to read schema_version: {}", e);
            0
        }
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: baseline schema -- users, activity sessions, settings.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            user_id     INTEGER PRIMARY KEY,
            username    TEXT,
            first_name  TEXT,
            last_name   TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS activities (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id          INTEGER NOT NULL,
            activity_type    TEXT NOT NULL,
            start_time       TEXT NOT NULL,
            end_time         TEXT,
            duration_seconds INTEGER
        );

        CREATE TABLE IF NOT EXISTS user_settings (
            user_id               INTEGER PRIMARY KEY,
            reminder_interval     INTEGER NOT NULL DEFAULT 1800,
            notifications_enabled INTEGER NOT NULL DEFAULT 1,
            quiet_time_enabled    INTEGER NOT NULL DEFAULT 1,
            quiet_time_start      TEXT NOT NULL DEFAULT '22:00',
            quiet_time_end        TEXT NOT NULL DEFAULT '06:00'
        );",
    )?;

    tx.execute("DELETE FROM schema_version", [])?;
    tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [1])?;

    tx.commit()?;
    Ok(())
}

/// Migration v2: per-user timezones and reminder bookkeeping.
///
/// Adds to the users table:
/// - timezone: IANA identifier, defaulting to the original launch zone
/// - last_reminder: timestamp of the last reminder sent
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "ALTER TABLE users ADD COLUMN timezone TEXT NOT NULL DEFAULT 'Europe/Moscow';
         ALTER TABLE users ADD COLUMN last_reminder TEXT;",
    )?;

    tx.execute("DELETE FROM schema_version", [])?;
    tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [2])?;

    tx.commit()?;
    Ok(())
}

/// Migration v3: indexes for the open-session lookup and window scans.
fn migrate_v3(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_activities_user_open
             ON activities(user_id) WHERE end_time IS NULL;
         CREATE INDEX IF NOT EXISTS idx_activities_user_start
             ON activities(user_id, start_time);",
    )?;

    tx.execute("DELETE FROM schema_version", [])?;
    tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [3])?;

    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test migration from scratch (v0 -> v3)
    #[test]
    fn test_migrate_from_scratch() {
        let conn = Connection::open_in_memory().unwrap();

        migrate(&conn).unwrap();

        let version = get_schema_version(&conn);
        assert_eq!(version, 3);

        // New columns from v2 exist.
        conn.execute(
            "INSERT INTO users (user_id, first_name) VALUES (7, 'Ann')",
            [],
        )
        .unwrap();
        let tz: String = conn
            .query_row("SELECT timezone FROM users WHERE user_id = 7", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(tz, "Europe/Moscow");
    }

    /// Test that migrations are idempotent
    #[test]
    fn test_migrate_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        migrate(&conn).unwrap();
        migrate(&conn).unwrap();

        let version = get_schema_version(&conn);
        assert_eq!(version, 3);
    }

    /// Test incremental migration (v1 -> v3)
    #[test]
    fn test_incremental_migration() {
        let conn = Connection::open_in_memory().unwrap();

        // Create the v1 schema by hand, marked at version 1.
        conn.execute_batch(
            "CREATE TABLE users (
                user_id     INTEGER PRIMARY KEY,
                username    TEXT,
                first_name  TEXT,
                last_name   TEXT,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );
            CREATE TABLE activities (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id          INTEGER NOT NULL,
                activity_type    TEXT NOT NULL,
                start_time       TEXT NOT NULL,
                end_time         TEXT,
                duration_seconds INTEGER
            );
            CREATE TABLE user_settings (
                user_id               INTEGER PRIMARY KEY,
                reminder_interval     INTEGER NOT NULL DEFAULT 1800,
                notifications_enabled INTEGER NOT NULL DEFAULT 1,
                quiet_time_enabled    INTEGER NOT NULL DEFAULT 1,
                quiet_time_start      TEXT NOT NULL DEFAULT '22:00',
                quiet_time_end        TEXT NOT NULL DEFAULT '06:00'
            );
            CREATE TABLE schema_version (version INTEGER PRIMARY KEY);
            INSERT INTO schema_version (version) VALUES (1);",
        )
        .unwrap();

        migrate(&conn).unwrap();

        let version = get_schema_version(&conn);
        assert_eq!(version, 3);

        // Columns added by v2 should exist.
        let stmt = conn
            .prepare("SELECT timezone, last_reminder FROM users")
            .unwrap();
        drop(stmt);
    }
}
