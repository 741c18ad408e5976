//! Calendar backend contract.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};

use crate::error::CalendarError;

/// Login material for a calendar server.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub url: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Authenticated identity returned by [`CalendarBackend::authenticate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Backend-specific address of the principal (e.g. its collection URL).
    pub href: String,
}

/// One calendar visible to a principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCalendar {
    /// Display name, matched against `CalendarConfig::name`.
    pub name: String,
    /// Backend-specific address of the calendar.
    pub href: String,
}

/// One concrete start of a calendar event inside a searched window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub start: DateTime<FixedOffset>,
}

impl Occurrence {
    /// Start instant normalised to UTC.
    #[inline]
    pub fn start_utc(&self) -> DateTime<Utc> {
        self.start.with_timezone(&Utc)
    }
}

/// Remote calendar queried by the calendar service.
///
/// Implementations own the connection; the service owns the backend.
#[async_trait]
pub trait CalendarBackend: Send {
    /// Logs in and returns the authenticated principal.
    async fn authenticate(&mut self, credentials: &Credentials) -> Result<Principal, CalendarError>;

    /// Lists calendars visible to `principal`.
    async fn list_calendars(
        &mut self,
        principal: &Principal,
    ) -> Result<Vec<RemoteCalendar>, CalendarError>;

    /// Returns every occurrence in `calendar` overlapping `[start, end)`, with
    /// recurring events expanded. An empty vector is a valid answer.
    async fn search_events(
        &mut self,
        calendar: &RemoteCalendar,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Occurrence>, CalendarError>;
}
