//! TOML-based application configuration.
//!
//! Stores process-level preferences:
//! - Reminder loop tuning (tick cadence, send timeout, cache age)
//! - The default timezone for users without a usable zone
//!
//! Per-user reminder settings live in the database, not here.
//!
//! Configuration is stored at `~/.config/timetally/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::data_dir;
use crate::reminder::SchedulerSettings;

/// Reminder scheduler tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemindersConfig {
    /// Below this many seconds an interval is a "test" interval: scheduled
    /// relative to now instead of clock-aligned, and exempt from quiet hours.
    #[serde(default = "default_align_threshold")]
    pub align_threshold_secs: i64,
    /// Tick sleep when any candidate has a sub-minute interval.
    #[serde(default = "default_fast_tick")]
    pub fast_tick_secs: u64,
    /// Tick sleep otherwise.
    #[serde(default = "default_idle_tick")]
    pub idle_tick_secs: u64,
    /// Upper bound on a single reminder delivery.
    #[serde(default = "default_send_timeout")]
    pub send_timeout_secs: u64,
    /// Cache entries further past due than this are swept.
    #[serde(default = "default_cache_max_age")]
    pub cache_max_age_secs: i64,
}

/// Timezone configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimezoneConfig {
    /// Fallback zone for users with no or an unresolvable timezone.
    #[serde(default = "default_timezone")]
    pub default: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/timetally/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub reminders: RemindersConfig,
    #[serde(default)]
    pub timezone: TimezoneConfig,
}

// Default functions
fn default_align_threshold() -> i64 {
    60
}
fn default_fast_tick() -> u64 {
    1
}
fn default_idle_tick() -> u64 {
    30
}
fn default_send_timeout() -> u64 {
    10
}
fn default_cache_max_age() -> i64 {
    86_400
}
fn default_timezone() -> String {
    crate::clock::DEFAULT_TIMEZONE.into()
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            align_threshold_secs: default_align_threshold(),
            fast_tick_secs: default_fast_tick(),
            idle_tick_secs: default_idle_tick(),
            send_timeout_secs: default_send_timeout(),
            cache_max_age_secs: default_cache_max_age(),
        }
    }
}

impl Default for TimezoneConfig {
    fn default() -> Self {
        Self {
            default: default_timezone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reminders: RemindersConfig::default(),
            timezone: TimezoneConfig::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err("config key is empty".into());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| format!("unknown config key: {key}"))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| format!("unknown config key: {key}"))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(value.parse::<bool>()?),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<i64>() {
                            serde_json::Value::Number(n.into())
                        } else {
                            return Err(format!("cannot parse '{value}' as number").into());
                        }
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| format!("unknown config key: {key}"))?;
        }

        Err(format!("unknown config key: {key}").into())
    }

    fn path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(Self::path()?, content)?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json)?;
        self.save()?;
        Ok(())
    }

    /// Scheduler settings derived from this configuration.
    pub fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            align_threshold_secs: self.reminders.align_threshold_secs,
            fast_tick: Duration::from_secs(self.reminders.fast_tick_secs),
            idle_tick: Duration::from_secs(self.reminders.idle_tick_secs),
            send_timeout: Duration::from_secs(self.reminders.send_timeout_secs),
            cache_max_age_secs: self.reminders.cache_max_age_secs,
            default_tz: crate::clock::resolve_tz(&self.timezone.default, crate::clock::DEFAULT_TZ),
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
