//! # CalendarService: polls the calendar and announces occurrences.
//!
//! ## State machine
//! ```text
//!            ┌──────────── auth / lookup failure ───────────┐
//!            ▼                                              │
//! LoggedOut ──► Authenticating ──► Polling ◄──── success ── Degraded
//!                                     │                        ▲
//!                                     └──── any failure ───────┘
//! ```
//!
//! ## Tick
//! ```text
//! drain inbox ─► RequestCalendarUpdate(Pressed) sets `forced`
//! if now >= next_update || forced:
//!   ensure session (authenticate + find calendar; skipped when logged in)
//!   search [now - grace | now, now + lookahead)   (grace on first fetch only)
//!     ├─ Ok  ─► replace set, next_update = now + refresh,
//!     │         publish EventNext(min) if the set is non-empty
//!     └─ Err ─► next_update = now + retry, publish CalendarError(msg)
//! fire every stored start <= now as EventStarted, then EventNext(new min)
//! ```
//!
//! ## Rules
//! - Always returns `KeepRunning`; errors become bus events.
//! - An empty search result is a success that publishes nothing.
//! - Identical start instants collapse to one stored occurrence.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use crate::adapters::{CalendarBackend, Credentials, RemoteCalendar};
use crate::config::CalendarConfig;
use crate::error::CalendarError;
use crate::events::{Bus, Event, Inbox, Topic};
use crate::tasks::{Continuation, Task};

/// Connection state of the calendar service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarState {
    /// No session yet, or the last one was dropped.
    LoggedOut,
    /// Login and calendar lookup in progress.
    Authenticating,
    /// Last fetch succeeded.
    Polling,
    /// Last fetch failed; a retry is scheduled.
    Degraded,
}

/// Polls a [`CalendarBackend`] and publishes `EventNext` / `EventStarted` /
/// `CalendarError`.
pub struct CalendarService {
    backend: Box<dyn CalendarBackend>,
    bus: Bus,
    inbox: Inbox,

    calendar_name: String,
    credentials: Credentials,
    lookahead: TimeDelta,
    grace: TimeDelta,
    refresh_interval: TimeDelta,
    retry_interval: TimeDelta,

    state: CalendarState,
    session: Option<RemoteCalendar>,
    first_fetch: bool,
    events: BTreeSet<DateTime<Utc>>,
    next_update: Option<DateTime<Utc>>,
}

impl CalendarService {
    /// Creates the service and subscribes it to `RequestCalendarUpdate`.
    ///
    /// The first fetch happens on the first tick.
    pub fn new(backend: Box<dyn CalendarBackend>, bus: Bus, cfg: &CalendarConfig) -> Self {
        let inbox = bus.inbox("calendar");
        bus.subscribe(&inbox, Topic::RequestCalendarUpdate);

        Self {
            backend,
            bus,
            inbox,
            calendar_name: cfg.name.clone(),
            credentials: cfg.credentials(),
            lookahead: cfg.lookahead(),
            grace: cfg.grace(),
            refresh_interval: cfg.refresh_interval(),
            retry_interval: cfg.retry_interval(),
            state: CalendarState::LoggedOut,
            session: None,
            first_fetch: true,
            events: BTreeSet::new(),
            next_update: None,
        }
    }

    pub fn state(&self) -> CalendarState {
        self.state
    }

    /// When the next scheduled fetch is due (`None` = on the next tick).
    pub fn next_update(&self) -> Option<DateTime<Utc>> {
        self.next_update
    }

    /// Stored upcoming occurrences, earliest first.
    pub fn upcoming(&self) -> impl Iterator<Item = &DateTime<Utc>> + '_ {
        self.events.iter()
    }

    fn drain_requests(&mut self) -> bool {
        let mut forced = false;
        while let Some(ev) = self.inbox.drain() {
            if matches!(ev, Event::RequestCalendarUpdate(_)) && ev.is_press() {
                tracing::info!("calendar refresh requested");
                forced = true;
            }
        }
        forced
    }

    /// Logs in and resolves the configured calendar unless a session exists.
    async fn ensure_session(&mut self) -> Result<RemoteCalendar, CalendarError> {
        if let Some(cal) = &self.session {
            return Ok(cal.clone());
        }

        self.state = CalendarState::Authenticating;
        let principal = self.backend.authenticate(&self.credentials).await?;
        let calendars = self.backend.list_calendars(&principal).await?;
        let cal = calendars
            .into_iter()
            .find(|c| c.name == self.calendar_name)
            .ok_or_else(|| CalendarError::NoMatchingResource {
                name: self.calendar_name.clone(),
            })?;

        tracing::info!(calendar = %cal.name, "logged in");
        self.session = Some(cal.clone());
        Ok(cal)
    }

    /// Fetches occurrences and replaces the stored set.
    async fn fetch(&mut self, now: DateTime<Utc>) -> Result<(), CalendarError> {
        let calendar = self.ensure_session().await?;

        let floor = if self.first_fetch { now - self.grace } else { now };
        let found = self
            .backend
            .search_events(&calendar, floor, now + self.lookahead)
            .await?;

        self.events = found
            .iter()
            .map(|o| o.start_utc())
            .filter(|start| *start > floor)
            .collect();
        self.first_fetch = false;
        Ok(())
    }

    async fn refresh(&mut self, now: DateTime<Utc>) {
        // read before fetch: a fresh login passes through Authenticating
        let recovered = self.state == CalendarState::Degraded;
        match self.fetch(now).await {
            Ok(()) => {
                self.state = CalendarState::Polling;
                self.next_update = Some(now + self.refresh_interval);
                tracing::debug!(count = self.events.len(), "calendar fetched");

                if recovered {
                    self.bus.publish(Event::CalendarError(None));
                }
                if let Some(first) = self.events.first() {
                    self.bus.publish(Event::EventNext(*first));
                }
            }
            Err(err) => {
                if err.drops_session() {
                    self.session = None;
                }
                self.state = CalendarState::Degraded;
                self.next_update = Some(now + self.retry_interval);
                tracing::warn!(
                    error = %err,
                    label = err.as_label(),
                    retry_at = %now + self.retry_interval,
                    "calendar fetch failed"
                );
                self.bus.publish(Event::CalendarError(Some(err.as_message())));
            }
        }
    }

    /// Publishes and removes every occurrence that has started.
    fn fire_started(&mut self, now: DateTime<Utc>) {
        let pending = self.events.split_off(&(now + TimeDelta::nanoseconds(1)));
        let started = std::mem::replace(&mut self.events, pending);
        if started.is_empty() {
            return;
        }

        for at in &started {
            tracing::info!(start = %at, "calendar event started");
            self.bus.publish(Event::EventStarted(*at));
        }
        if let Some(first) = self.events.first() {
            self.bus.publish(Event::EventNext(*first));
        }
    }
}

#[async_trait]
impl Task for CalendarService {
    fn name(&self) -> &str {
        "calendar"
    }

    async fn tick(&mut self, now: DateTime<Utc>) -> Continuation {
        let forced = self.drain_requests();
        let due = self.next_update.is_none_or(|at| now >= at);

        if due || forced {
            self.refresh(now).await;
        }
        self.fire_started(now);
        Continuation::KeepRunning
    }
}
