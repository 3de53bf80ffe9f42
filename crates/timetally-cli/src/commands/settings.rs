use chrono::{NaiveTime, Utc};
use clap::{Subcommand, ValueEnum};
use serde::Deserialize;

use timetally_core::clock;
use timetally_core::format;
use timetally_core::storage::{Config, Database};

#[derive(ValueEnum, Clone, Copy)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    fn as_bool(self) -> bool {
        matches!(self, Toggle::On)
    }
}

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show current settings
    Show,
    /// Set the reminder interval in seconds (0 disables)
    Interval { seconds: i64 },
    /// Enable or disable reminders
    Notifications { state: Toggle },
    /// Enable or disable quiet hours
    Quiet { state: Toggle },
    /// Set the quiet window boundaries (HH:MM)
    QuietWindow { start: String, end: String },
    /// Set the IANA timezone
    Timezone { zone: String },
    /// Detect the timezone from the host's public IP
    DetectTimezone,
}

pub fn run(user: i64, action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    db.ensure_user(user, None, None, None)?;

    match action {
        SettingsAction::Show => show(&db, user)?,
        SettingsAction::Interval { seconds } => {
            if seconds < 0 {
                return Err("interval must be zero or positive".into());
            }
            db.set_reminder_interval(user, seconds)?;
            println!("Reminder interval: {}", format::format_interval(seconds));
        }
        SettingsAction::Notifications { state } => {
            db.set_notifications_enabled(user, state.as_bool())?;
            println!(
                "Notifications {}",
                if state.as_bool() { "on" } else { "off" }
            );
        }
        SettingsAction::Quiet { state } => {
            db.set_quiet_enabled(user, state.as_bool())?;
            println!("Quiet hours {}", if state.as_bool() { "on" } else { "off" });
        }
        SettingsAction::QuietWindow { start, end } => {
            // Stored boundaries fail open to midnight when malformed, so
            // reject bad input here at the door.
            for boundary in [&start, &end] {
                NaiveTime::parse_from_str(boundary, "%H:%M")
                    .map_err(|_| format!("'{boundary}' is not an HH:MM time"))?;
            }
            db.set_quiet_window(user, &start, &end)?;
            println!("Quiet hours {start}-{end}");
        }
        SettingsAction::Timezone { zone } => {
            if !clock::is_valid_tz(&zone) {
                return Err(format!("'{zone}' is not a known IANA timezone").into());
            }
            db.set_timezone(user, &zone)?;
            println!("Timezone: {zone}");
        }
        SettingsAction::DetectTimezone => {
            let zone = tokio::runtime::Runtime::new()?
                .block_on(detect_by_ip())
                .unwrap_or_else(|| {
                    let fallback = Config::load_or_default().timezone.default;
                    println!("Detection failed, using {fallback}");
                    fallback
                });
            if clock::is_valid_tz(&zone) {
                db.set_timezone(user, &zone)?;
                println!("Timezone: {zone}");
            } else {
                return Err(format!("detected zone '{zone}' is not usable").into());
            }
        }
    }
    Ok(())
}

fn show(db: &Database, user: i64) -> Result<(), Box<dyn std::error::Error>> {
    let settings = db.settings(user)?.unwrap_or_default();
    let tz_name = db.timezone(user)?;
    let tz = clock::resolve_tz(&tz_name, clock::DEFAULT_TZ);

    println!(
        "Interval: {}",
        format::format_interval(settings.reminder_interval)
    );
    println!(
        "Notifications: {}",
        if settings.notifications_enabled { "on" } else { "off" }
    );
    println!(
        "Quiet hours: {} ({}-{})",
        if settings.quiet_time_enabled { "on" } else { "off" },
        settings.quiet_time_start,
        settings.quiet_time_end
    );
    println!("Timezone: {tz_name}");
    println!("Local time: {}", clock::format_local_time(tz, Utc::now()));
    Ok(())
}

#[derive(Deserialize)]
struct IpApiResponse {
    timezone: Option<String>,
}

/// Free geolocation endpoint; any failure just means no detection.
async fn detect_by_ip() -> Option<String> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(3))
        .build()
        .ok()?;
    let response = client.get("http://ip-api.com/json/").send().await.ok()?;
    let body: IpApiResponse = response.json().await.ok()?;
    body.timezone
}
