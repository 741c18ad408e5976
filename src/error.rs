//! Error types raised by the adapters and the configuration loader.
//!
//! This module defines one enum per collaborator:
//!
//! - [`CalendarError`]: calendar backend failures (login, lookup, transport).
//! - [`AudioError`]: audio/stream backend failures.
//! - [`DisplayError`]: display panel failures.
//! - [`ConfigError`]: configuration file failures.
//!
//! Services never let these escape a tick: they are logged, turned into bus
//! events where a topic exists, and retried on the service's own schedule.
//! Each enum provides `as_label` (stable snake_case, for logs) and the
//! calendar one also provides `as_message` (short text shown on the panel).

use std::path::PathBuf;

use thiserror::Error;

/// # Errors produced by a calendar backend.
///
/// An empty search result is **not** an error: backends return `Ok(vec![])`
/// and the calendar service treats it as a normal outcome.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    /// The server rejected the credentials or the login handshake failed.
    #[error("authentication failed: {reason}")]
    AuthFailure {
        /// Backend-provided detail.
        reason: String,
    },

    /// Network or server error while talking to the calendar backend.
    #[error("calendar backend unavailable: {reason}")]
    BackendUnavailable {
        /// Backend-provided detail.
        reason: String,
    },

    /// Login succeeded but no calendar carries the configured name.
    #[error("no calendar named {name:?}")]
    NoMatchingResource {
        /// The calendar name that was looked up.
        name: String,
    },
}

impl CalendarError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use inkclock::CalendarError;
    ///
    /// let err = CalendarError::NoMatchingResource { name: "work alarm".into() };
    /// assert_eq!(err.as_label(), "calendar_not_found");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            CalendarError::AuthFailure { .. } => "calendar_auth_failed",
            CalendarError::BackendUnavailable { .. } => "calendar_unavailable",
            CalendarError::NoMatchingResource { .. } => "calendar_not_found",
        }
    }

    /// Returns the short message published on the `CalendarError` topic
    /// and shown next to the warning icon.
    pub fn as_message(&self) -> String {
        match self {
            CalendarError::AuthFailure { .. } => "Failed to login".to_string(),
            CalendarError::BackendUnavailable { .. } => "Failed to get new events".to_string(),
            CalendarError::NoMatchingResource { name } => format!("No calendar named \"{name}\""),
        }
    }

    /// Indicates whether the failure invalidates the current session.
    ///
    /// Returns `true` for [`CalendarError::AuthFailure`] and
    /// [`CalendarError::NoMatchingResource`]; transport errors keep the session.
    pub fn drops_session(&self) -> bool {
        matches!(
            self,
            CalendarError::AuthFailure { .. } | CalendarError::NoMatchingResource { .. }
        )
    }
}

/// # Errors produced by an audio backend.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// The stream or output device could not be reached.
    #[error("audio backend unavailable: {reason}")]
    Unavailable {
        /// Backend-provided detail.
        reason: String,
    },

    /// The backend refused the request (bad URI, volume out of range, ...).
    #[error("audio request rejected: {reason}")]
    Rejected {
        /// Backend-provided detail.
        reason: String,
    },
}

impl AudioError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            AudioError::Unavailable { .. } => "audio_unavailable",
            AudioError::Rejected { .. } => "audio_rejected",
        }
    }
}

/// # Errors produced by a display driver.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DisplayError {
    /// Transfer to the panel failed.
    #[error("display bus error: {reason}")]
    Bus {
        /// Driver-provided detail.
        reason: String,
    },

    /// The panel did not become ready in time.
    #[error("display busy for {waited_ms}ms")]
    Busy {
        /// How long the driver waited on the busy line.
        waited_ms: u64,
    },
}

impl DisplayError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            DisplayError::Bus { .. } => "display_bus",
            DisplayError::Busy { .. } => "display_busy",
        }
    }
}

/// # Errors produced while loading configuration.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path:?}: {source}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`Config`](crate::Config).
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
