//! # Runtime configuration.
//!
//! Provides [`Config`], centralized settings for the scheduler and the three
//! clock services, grouped per component.
//!
//! Config is built in up to three layers:
//! 1. **Defaults**: `Config::default()` carries the reference values.
//! 2. **File**: [`Config::load`] / [`Config::from_toml_str`] read TOML; missing
//!    keys keep their defaults.
//! 3. **Environment**: [`Config::with_env_overrides`] replaces credentials and
//!    the stream URL from `INKCLOCK_*` variables.
//!
//! ## Example
//! ```rust
//! use inkclock::Config;
//!
//! let cfg = Config::from_toml_str(r#"
//!     [calendar]
//!     name = "alarms"
//!     retry_minutes = 5
//! "#).unwrap();
//!
//! assert_eq!(cfg.calendar.name, "alarms");
//! assert_eq!(cfg.calendar.retry_interval().num_minutes(), 5);
//! assert_eq!(cfg.calendar.refresh_interval().num_hours(), 2);
//! ```
//!
//! ## Sentinel values
//! - `tick_ms = 0` → clamped to 1ms
//! - `full_refresh_every = 0` → clamped to 1 (every scheduled redraw is full)

use std::fmt;
use std::path::Path;
use std::time::Duration;

use chrono::TimeDelta;
use serde::Deserialize;

use crate::adapters::Credentials;
use crate::error::ConfigError;

/// Environment variable overriding [`CalendarConfig::url`].
pub const ENV_CALENDAR_URL: &str = "INKCLOCK_CALENDAR_URL";
/// Environment variable overriding [`CalendarConfig::username`].
pub const ENV_CALENDAR_USERNAME: &str = "INKCLOCK_CALENDAR_USERNAME";
/// Environment variable overriding [`CalendarConfig::password`].
pub const ENV_CALENDAR_PASSWORD: &str = "INKCLOCK_CALENDAR_PASSWORD";
/// Environment variable overriding [`AlarmConfig::stream_url`].
pub const ENV_STREAM_URL: &str = "INKCLOCK_STREAM_URL";

/// Top-level configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scheduler: SchedulerConfig,
    pub calendar: CalendarConfig,
    pub alarm: AlarmConfig,
    pub display: DisplayConfig,
}

impl Config {
    /// Parses a TOML document; absent keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Reads and parses the TOML file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Applies `INKCLOCK_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides using `lookup` as the variable source.
    ///
    /// Empty values are ignored.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get(ENV_CALENDAR_URL) {
            self.calendar.url = v;
        }
        if let Some(v) = get(ENV_CALENDAR_USERNAME) {
            self.calendar.username = v;
        }
        if let Some(v) = get(ENV_CALENDAR_PASSWORD) {
            self.calendar.password = v;
        }
        if let Some(v) = get(ENV_STREAM_URL) {
            self.alarm.stream_url = v;
        }
        self
    }
}

/// Scheduler settings.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Sleep between cycles, in milliseconds.
    pub tick_ms: u64,
}

impl SchedulerConfig {
    /// Returns the inter-cycle sleep clamped to a minimum of 1ms.
    #[inline]
    pub fn quantum(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

impl Default for SchedulerConfig {
    /// `tick_ms = 1000`.
    fn default() -> Self {
        Self { tick_ms: 1000 }
    }
}

/// Calendar polling settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Display name of the calendar to watch.
    pub name: String,
    /// Server URL.
    pub url: String,
    pub username: String,
    pub password: String,
    /// How far ahead to search for occurrences.
    pub lookahead_days: u32,
    /// On the first fetch, how far back an already-started occurrence is still kept.
    pub grace_minutes: u32,
    /// Delay after a successful fetch.
    pub refresh_minutes: u32,
    /// Delay after a failed fetch.
    pub retry_minutes: u32,
}

impl CalendarConfig {
    #[inline]
    pub fn lookahead(&self) -> TimeDelta {
        TimeDelta::days(i64::from(self.lookahead_days))
    }

    #[inline]
    pub fn grace(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.grace_minutes))
    }

    #[inline]
    pub fn refresh_interval(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.refresh_minutes))
    }

    #[inline]
    pub fn retry_interval(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.retry_minutes))
    }

    /// Login material for the calendar backend.
    pub fn credentials(&self) -> Credentials {
        Credentials {
            url: self.url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

impl Default for CalendarConfig {
    /// 14 day lookahead, 1h grace, refresh every 2h, retry after 15min.
    fn default() -> Self {
        Self {
            name: "work alarm".to_string(),
            url: String::new(),
            username: String::new(),
            password: String::new(),
            lookahead_days: 14,
            grace_minutes: 60,
            refresh_minutes: 120,
            retry_minutes: 15,
        }
    }
}

impl fmt::Debug for CalendarConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalendarConfig")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"***")
            .field("lookahead_days", &self.lookahead_days)
            .field("grace_minutes", &self.grace_minutes)
            .field("refresh_minutes", &self.refresh_minutes)
            .field("retry_minutes", &self.retry_minutes)
            .finish()
    }
}

/// Alarm playback settings.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AlarmConfig {
    /// Stream played when an alarm rings or the button toggles playback.
    pub stream_url: String,
    /// How long an alarm rings before it expires on its own.
    pub ring_minutes: u32,
}

impl AlarmConfig {
    #[inline]
    pub fn ring_duration(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.ring_minutes))
    }
}

impl Default for AlarmConfig {
    /// Ring for 30 minutes.
    fn default() -> Self {
        Self {
            stream_url: String::new(),
            ring_minutes: 30,
        }
    }
}

/// Display refresh settings.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Every n-th scheduled redraw is a full refresh.
    pub full_refresh_every: u32,
    /// Only events starting within this many hours get the alert banner.
    pub alert_lookahead_hours: u32,
}

impl DisplayConfig {
    /// Returns the full-refresh period clamped to a minimum of 1.
    #[inline]
    pub fn full_refresh_every(&self) -> u32 {
        self.full_refresh_every.max(1)
    }

    #[inline]
    pub fn alert_lookahead(&self) -> TimeDelta {
        TimeDelta::hours(i64::from(self.alert_lookahead_hours))
    }
}

impl Default for DisplayConfig {
    /// Full refresh every 10th scheduled redraw, 12h alert window.
    fn default() -> Self {
        Self {
            full_refresh_every: 10,
            alert_lookahead_hours: 12,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_values() {
        let cfg = Config::default();
        assert_eq!(cfg.scheduler.quantum(), Duration::from_secs(1));
        assert_eq!(cfg.calendar.lookahead(), TimeDelta::days(14));
        assert_eq!(cfg.calendar.grace(), TimeDelta::hours(1));
        assert_eq!(cfg.calendar.refresh_interval(), TimeDelta::hours(2));
        assert_eq!(cfg.calendar.retry_interval(), TimeDelta::minutes(15));
        assert_eq!(cfg.alarm.ring_duration(), TimeDelta::minutes(30));
        assert_eq!(cfg.display.full_refresh_every(), 10);
        assert_eq!(cfg.display.alert_lookahead(), TimeDelta::hours(12));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = Config::from_toml_str(
            r#"
            [scheduler]
            tick_ms = 0

            [display]
            full_refresh_every = 0
            "#,
        )
        .unwrap();
        assert_eq!(cfg.scheduler.quantum(), Duration::from_millis(1));
        assert_eq!(cfg.display.full_refresh_every(), 1);
        assert_eq!(cfg.calendar.name, "work alarm");
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = Config::from_toml_str("[calendar\nname = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = Config::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn env_overrides_replace_credentials_only_when_set() {
        let cfg = Config::default().with_overrides_from(|key| match key {
            ENV_CALENDAR_USERNAME => Some("alice".into()),
            ENV_CALENDAR_PASSWORD => Some(String::new()),
            ENV_STREAM_URL => Some("http://radio.example/stream".into()),
            _ => None,
        });
        assert_eq!(cfg.calendar.username, "alice");
        assert_eq!(cfg.calendar.password, "");
        assert_eq!(cfg.alarm.stream_url, "http://radio.example/stream");
    }

    #[test]
    fn debug_masks_the_password() {
        let mut cfg = CalendarConfig::default();
        cfg.password = "hunter2".into();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("hunter2"));
    }
}
