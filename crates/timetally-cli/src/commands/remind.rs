use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use clap::Subcommand;
use tokio::sync::Mutex;

use timetally_core::clock;
use timetally_core::reminder::{
    next_fire, reminder_text, DeliveryOutcome, Notifier, ReminderCache, ReminderScheduler,
    ReminderService,
};
use timetally_core::storage::{Config, Database, UserId};

#[derive(Subcommand)]
pub enum RemindAction {
    /// Run the reminder loop until interrupted
    Run,
    /// Send one reminder now
    Send,
    /// Show when the next reminder would fire
    Next,
}

/// Prints reminders to the terminal; the production transport lives in the
/// chat frontend.
struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, user: UserId, text: &str) -> DeliveryOutcome {
        println!("--- reminder for user {user} ---");
        println!("{text}");
        DeliveryOutcome::Delivered
    }
}

pub fn run(user: i64, action: RemindAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        RemindAction::Run => run_loop(),
        RemindAction::Send => send_once(user),
        RemindAction::Next => show_next(user),
    }
}

fn run_loop() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let scheduler = ReminderScheduler::new(
            Arc::new(Mutex::new(db)),
            Arc::new(ConsoleNotifier),
            Arc::new(Mutex::new(ReminderCache::new())),
            config.scheduler_settings(),
        );
        let service = ReminderService::start(scheduler);
        println!("Reminder loop running, press Ctrl-C to stop");

        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to wait for Ctrl-C");
        }
        service.stop().await;
    });
    Ok(())
}

fn send_once(user: i64) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let now = Utc::now();
    let text = reminder_text(&db, user, now)?;
    println!("{text}");
    db.set_last_reminder(user, now)?;
    Ok(())
}

fn show_next(user: i64) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;

    let settings = db.settings(user)?.unwrap_or_default();
    if settings.reminder_interval == 0 || !settings.notifications_enabled {
        println!("Reminders are off");
        return Ok(());
    }

    let tz = clock::resolve_tz(
        &db.timezone(user)?,
        config.scheduler_settings().default_tz,
    );
    let now_local = clock::local_now(tz, Utc::now());
    let fire_at = next_fire(
        now_local,
        settings.reminder_interval,
        config.reminders.align_threshold_secs,
    );
    println!("Next reminder at {}", fire_at.format("%H:%M:%S"));
    Ok(())
}
