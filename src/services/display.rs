//! # DisplayCoordinator: decides when and how the panel is redrawn.
//!
//! ## Redraw triggers
//! - **scheduled**: `now >= next_displayed_minute`; the minute then advances
//!   by exactly one.
//! - **async**: any `SongName`, `Radio(Off)`, `EventNext`, `CalendarError`
//!   or `EventStarted` drained this tick.
//!
//! ## Refresh policy
//! ```text
//! async (even if also scheduled) ──► Partial, counter untouched
//! scheduled, counter <  N - 1    ──► Partial, counter += 1
//! scheduled, counter >= N - 1    ──► Full,    counter  = 0
//! ```
//! The counter starts at `N - 1`, so the first scheduled redraw is full.
//! The panel is put to sleep after every redraw.

use async_trait::async_trait;
use chrono::{DateTime, DurationRound, Local, TimeDelta, Utc};

use crate::adapters::{Banner, ClockFace, Compositor, DisplayDriver, NetworkPresence};
use crate::config::DisplayConfig;
use crate::error::DisplayError;
use crate::events::{Bus, Event, Inbox, RadioState, Topic};
use crate::tasks::{Continuation, Task};

/// How a redraw is pushed to the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// Fast, may leave ghosting.
    Partial,
    /// Flashes the whole panel and clears ghosting.
    Full,
}

/// What the coordinator currently knows and last showed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayState {
    /// Minute of the last redraw, `None` before the first one.
    pub last_displayed_minute: Option<DateTime<Utc>>,
    /// Minute at which the next scheduled redraw is due.
    pub next_displayed_minute: DateTime<Utc>,
    /// Scheduled partial redraws since the last full one.
    pub partial_refresh_count: u32,
    pub song_label: Option<String>,
    pub next_event: Option<DateTime<Utc>>,
    pub last_calendar_error: Option<String>,
}

/// Local `HHMM` label used for the clock and the alert banner.
pub fn hhmm(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H%M").to_string()
}

fn truncate_to_minute(at: DateTime<Utc>) -> DateTime<Utc> {
    at.duration_trunc(TimeDelta::minutes(1)).unwrap_or(at)
}

/// Owns the panel and redraws it from bus events and the wall clock.
pub struct DisplayCoordinator {
    driver: Box<dyn DisplayDriver>,
    compositor: Box<dyn Compositor>,
    presence: Box<dyn NetworkPresence>,
    inbox: Inbox,

    full_refresh_every: u32,
    alert_lookahead: TimeDelta,
    state: DisplayState,
}

impl DisplayCoordinator {
    /// Creates the coordinator; the first scheduled redraw is due at `now`'s minute.
    pub fn new(
        driver: Box<dyn DisplayDriver>,
        compositor: Box<dyn Compositor>,
        presence: Box<dyn NetworkPresence>,
        bus: &Bus,
        cfg: &DisplayConfig,
        now: DateTime<Utc>,
    ) -> Self {
        let inbox = bus.inbox("display");
        bus.subscribe_all(
            &inbox,
            &[
                Topic::SongName,
                Topic::Radio,
                Topic::EventNext,
                Topic::CalendarError,
                Topic::EventStarted,
            ],
        );

        let full_refresh_every = cfg.full_refresh_every();
        Self {
            driver,
            compositor,
            presence,
            inbox,
            full_refresh_every,
            alert_lookahead: cfg.alert_lookahead(),
            state: DisplayState {
                last_displayed_minute: None,
                next_displayed_minute: truncate_to_minute(now),
                partial_refresh_count: full_refresh_every - 1,
                song_label: None,
                next_event: None,
                last_calendar_error: None,
            },
        }
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// Wakes the panel and leaves it blank and asleep.
    pub async fn power_on(&mut self) -> Result<(), DisplayError> {
        tracing::info!("display power on");
        self.wipe().await
    }

    /// Blanks the panel before the process exits.
    pub async fn blank(&mut self) -> Result<(), DisplayError> {
        tracing::info!("display blank");
        self.wipe().await
    }

    async fn wipe(&mut self) -> Result<(), DisplayError> {
        self.driver.init().await?;
        self.driver.clear().await?;
        self.driver.sleep().await
    }

    /// Applies inbox events to the state; returns true if any of them changed
    /// what is shown.
    fn drain(&mut self) -> bool {
        let mut changed = false;
        while let Some(ev) = self.inbox.drain() {
            match ev {
                Event::SongName(label) => self.state.song_label = Some(label),
                Event::Radio(RadioState::Off) => self.state.song_label = None,
                Event::EventNext(at) => self.state.next_event = Some(at),
                Event::CalendarError(msg) => self.state.last_calendar_error = msg,
                Event::EventStarted(at) => {
                    if self.state.next_event.is_some_and(|next| next <= at) {
                        self.state.next_event = None;
                    }
                }
                _ => continue,
            }
            changed = true;
        }
        changed
    }

    fn refresh_mode(&mut self, scheduled: bool, asynchronous: bool) -> RefreshMode {
        if asynchronous || !scheduled {
            return RefreshMode::Partial;
        }
        if self.state.partial_refresh_count < self.full_refresh_every - 1 {
            self.state.partial_refresh_count += 1;
            RefreshMode::Partial
        } else {
            self.state.partial_refresh_count = 0;
            RefreshMode::Full
        }
    }

    fn face(&self, now: DateTime<Utc>) -> ClockFace {
        let alert = self
            .state
            .next_event
            .filter(|at| *at >= now && *at < now + self.alert_lookahead);

        let banner = match (alert, &self.state.last_calendar_error) {
            (Some(at), _) => Banner::Alert { time_label: hhmm(at) },
            (None, Some(message)) => Banner::Warning {
                message: message.clone(),
            },
            (None, None) => Banner::None,
        };

        ClockFace {
            time_label: hhmm(now),
            song: self.state.song_label.clone(),
            online: self.presence.is_online(),
            banner,
        }
    }

    async fn render(&mut self, face: &ClockFace, mode: RefreshMode) -> Result<(), DisplayError> {
        let (w, h) = self.driver.dimensions();
        let frame = self.compositor.compose(face, w, h);
        match mode {
            RefreshMode::Partial => {
                self.driver.init_partial().await?;
                self.driver.display_partial(&frame, 0, 0, w, h).await?;
            }
            RefreshMode::Full => {
                self.driver.init_fast().await?;
                self.driver.display(&frame).await?;
            }
        }
        self.driver.sleep().await
    }
}

#[async_trait]
impl Task for DisplayCoordinator {
    fn name(&self) -> &str {
        "display"
    }

    async fn tick(&mut self, now: DateTime<Utc>) -> Continuation {
        let asynchronous = self.drain();
        let scheduled = now >= self.state.next_displayed_minute;
        if !scheduled && !asynchronous {
            return Continuation::KeepRunning;
        }

        if scheduled {
            self.state.next_displayed_minute += TimeDelta::minutes(1);
        }
        let mode = self.refresh_mode(scheduled, asynchronous);
        let face = self.face(now);
        tracing::debug!(?mode, time = %face.time_label, asynchronous, "redraw");

        if let Err(err) = self.render(&face, mode).await {
            tracing::warn!(error = %err, label = err.as_label(), "redraw failed");
        }
        self.state.last_displayed_minute = Some(truncate_to_minute(now));
        Continuation::KeepRunning
    }

    async fn shutdown(&mut self) {
        if let Err(err) = self.blank().await {
            tracing::warn!(error = %err, label = err.as_label(), "blank at exit failed");
        }
    }
}
