//! The reminder tick loop.
//!
//! One background task serves every user: each iteration it fetches the
//! candidates (notifications on, interval > 0), evaluates quiet hours in the
//! user's own timezone, fires whatever is due and recomputes next-fire
//! times. A failure for one user is logged and never stops the others.
//!
//! The loop polls every second while any candidate runs a sub-minute test
//! interval, and backs off to a long idle sleep otherwise. Shutdown is
//! cooperative: a stop signal is observed at the sleep boundary, never
//! mid-user.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::clock;
use crate::error::DatabaseError;
use crate::format;
use crate::quiet;
use crate::session::compute_elapsed;
use crate::storage::{Database, ReminderCandidate, UserId};

use super::cache::{CacheKey, ReminderCache};
use super::notifier::{DeliveryOutcome, Notifier};
use super::schedule::next_fire;

/// Scheduler tuning, usually derived from [`crate::Config`].
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Intervals below this many seconds are test intervals: relative
    /// scheduling, quiet hours bypassed.
    pub align_threshold_secs: i64,
    /// Sleep while any candidate has a test interval.
    pub fast_tick: StdDuration,
    /// Sleep otherwise.
    pub idle_tick: StdDuration,
    /// Upper bound on one delivery attempt.
    pub send_timeout: StdDuration,
    /// Cache entries further past due than this are swept.
    pub cache_max_age_secs: i64,
    /// Zone for users whose stored timezone does not resolve.
    pub default_tz: Tz,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            align_threshold_secs: 60,
            fast_tick: StdDuration::from_secs(1),
            idle_tick: StdDuration::from_secs(30),
            send_timeout: StdDuration::from_secs(10),
            cache_max_age_secs: 86_400,
            default_tz: clock::DEFAULT_TZ,
        }
    }
}

/// What one tick did.
#[derive(Debug, Clone, Copy)]
pub struct TickOutcome {
    pub sent: usize,
    /// Whether any candidate runs a test interval, i.e. the loop should
    /// poll at the fast cadence.
    pub fast_poll: bool,
}

/// Build the reminder message for `user`: the running activity with its
/// elapsed time, or a nudge when nothing is being tracked.
pub fn reminder_text(
    db: &Database,
    user: UserId,
    now_utc: DateTime<Utc>,
) -> Result<String, DatabaseError> {
    match db.open_session(user)? {
        Some(open) => {
            let elapsed = compute_elapsed(open.started_at, now_utc);
            Ok(format!(
                "{} {}?\n{}",
                open.activity.emoji(),
                open.activity.name(),
                format::format_clock(elapsed)
            ))
        }
        None => Ok("❓ What are you doing?".to_string()),
    }
}

/// Per-user reminder scheduling over a shared database and notifier.
///
/// The next-fire cache is injected so embedders and tests can hold a handle
/// for invalidation while the loop owns the scheduler itself.
pub struct ReminderScheduler<N> {
    db: Arc<Mutex<Database>>,
    notifier: Arc<N>,
    cache: Arc<Mutex<ReminderCache>>,
    settings: SchedulerSettings,
}

impl<N: Notifier + 'static> ReminderScheduler<N> {
    pub fn new(
        db: Arc<Mutex<Database>>,
        notifier: Arc<N>,
        cache: Arc<Mutex<ReminderCache>>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            db,
            notifier,
            cache,
            settings,
        }
    }

    /// Handle to the shared next-fire cache.
    pub fn cache_handle(&self) -> Arc<Mutex<ReminderCache>> {
        Arc::clone(&self.cache)
    }

    /// Drop every cached next-fire time for `user`. Call whenever the
    /// user's interval or notification setting changes; the next tick
    /// recomputes from the new setting anchored at that tick's time.
    pub async fn invalidate_user(&self, user: UserId) {
        self.cache.lock().await.invalidate_user(user);
    }

    /// One pass over all candidates at `now_utc`.
    pub async fn tick(&self, now_utc: DateTime<Utc>) -> TickOutcome {
        let candidates = {
            let db = self.db.lock().await;
            match db.reminder_candidates() {
                Ok(candidates) => candidates,
                Err(e) => {
                    tracing::error!(error = %e, "failed to list reminder candidates");
                    return TickOutcome {
                        sent: 0,
                        fast_poll: false,
                    };
                }
            }
        };

        let fast_poll = candidates
            .iter()
            .any(|c| c.interval_secs < self.settings.align_threshold_secs);

        let mut sent = 0;
        for candidate in &candidates {
            match self.process_candidate(candidate, now_utc).await {
                Ok(true) => sent += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(user = candidate.user_id, error = %e, "skipping user this tick");
                }
            }
        }

        self.cache
            .lock()
            .await
            .sweep(now_utc.naive_utc(), self.settings.cache_max_age_secs);

        TickOutcome { sent, fast_poll }
    }

    /// Returns whether a reminder was sent. Errors here concern only this
    /// user; the caller logs them and carries on with the rest.
    async fn process_candidate(
        &self,
        candidate: &ReminderCandidate,
        now_utc: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let tz = clock::resolve_tz(&candidate.timezone, self.settings.default_tz);
        let now_local = clock::local_now(tz, now_utc);

        // Quiet hours apply in the user's wall clock. Test intervals bypass
        // them: a 5-second interval exists to be watched right now.
        if candidate.quiet_enabled
            && candidate.interval_secs >= self.settings.align_threshold_secs
            && quiet::is_quiet_time(
                now_local.time(),
                &candidate.quiet_start,
                &candidate.quiet_end,
            )
        {
            return Ok(false);
        }

        let key = CacheKey::new(candidate.user_id, candidate.interval_secs);
        let due = {
            let mut cache = self.cache.lock().await;
            match cache.next_fire(&key) {
                Some(fire_at) => now_local >= fire_at,
                None => {
                    let fire_at = next_fire(
                        now_local,
                        candidate.interval_secs,
                        self.settings.align_threshold_secs,
                    );
                    cache.set(key, fire_at);
                    // A freshly computed entry already due within a second
                    // fires immediately instead of waiting a whole cycle.
                    fire_at - now_local < Duration::seconds(1)
                }
            }
        };

        if !due {
            return Ok(false);
        }

        self.send_reminder(candidate.user_id, now_utc).await?;

        let mut cache = self.cache.lock().await;
        cache.set(
            key,
            next_fire(
                now_local,
                candidate.interval_secs,
                self.settings.align_threshold_secs,
            ),
        );
        Ok(true)
    }

    /// Deliver one reminder and record the attempt. Delivery failures and
    /// timeouts are logged, never propagated; `last_reminder` is recorded
    /// either way.
    async fn send_reminder(
        &self,
        user: UserId,
        now_utc: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        let text = {
            let db = self.db.lock().await;
            reminder_text(&db, user, now_utc)?
        };

        match tokio::time::timeout(self.settings.send_timeout, self.notifier.send(user, &text))
            .await
        {
            Ok(DeliveryOutcome::Delivered) => {
                tracing::debug!(user, "reminder delivered");
            }
            Ok(DeliveryOutcome::Failed(reason)) => {
                tracing::warn!(user, %reason, "reminder delivery failed");
            }
            Err(_) => {
                tracing::warn!(user, "reminder delivery timed out");
            }
        }

        let db = self.db.lock().await;
        db.set_last_reminder(user, now_utc)
    }

    /// Run the tick loop until `shutdown` flips to true or its sender goes
    /// away. Consumes the scheduler; keep a [`Self::cache_handle`] around if
    /// settings changes need to invalidate entries while the loop runs.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!("reminder scheduler started");
        loop {
            let outcome = self.tick(Utc::now()).await;

            let sleep_for = if outcome.fast_poll {
                self.settings.fast_tick
            } else {
                self.settings.idle_tick
            };

            tokio::select! {
                _ = tokio::time::sleep(sleep_for) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!("reminder scheduler stopped");
    }
}

/// A running scheduler: the spawned loop plus the handles needed to talk to
/// it from the outside.
pub struct ReminderService {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
    cache: Arc<Mutex<ReminderCache>>,
}

impl ReminderService {
    /// Spawn the tick loop on the current tokio runtime.
    pub fn start<N: Notifier + 'static>(scheduler: ReminderScheduler<N>) -> Self {
        let cache = scheduler.cache_handle();
        let (shutdown, rx) = watch::channel(false);
        let handle = tokio::spawn(scheduler.run(rx));
        Self {
            shutdown,
            handle,
            cache,
        }
    }

    /// Invalidate the user's cached next-fire times after a settings change.
    pub async fn invalidate_user(&self, user: UserId) {
        self.cache.lock().await.invalidate_user(user);
    }

    /// Request a cooperative stop and wait for the loop to wind down.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "reminder loop did not shut down cleanly");
        }
    }
}
