//! # inkclock
//!
//! **Inkclock** is the coordination core of an e-paper alarm clock.
//!
//! It polls a calendar, rings a network radio stream when an occurrence
//! starts, and redraws a slow e-paper panel without wearing it out. Every
//! service is a cooperative task ticked by a single-threaded scheduler, and
//! services talk to each other only through a topic-keyed event bus.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  ┌─────────────────┐  ┌─────────────────┐  ┌────────────────────┐  ┌────────┐
//!  │ CalendarService │  │ AlarmController │  │ DisplayCoordinator │  │ LogTap │
//!  │ (CalendarBackend│  │ (AudioBackend)  │  │ (DisplayDriver,    │  │        │
//!  │                 │  │                 │  │  Compositor)       │  │        │
//!  └───────┬─────────┘  └───────┬─────────┘  └─────────┬──────────┘  └───┬────┘
//!          │ tick(now)          │ tick(now)            │ tick(now)       │
//! ┌────────┴────────────────────┴──────────────────────┴─────────────────┴─────┐
//! │  Scheduler: round-robin, one tick per task per cycle, then sleep quantum   │
//! │  - panics are caught and logged, the task stays queued                     │
//! │  - Continuation::Stop removes a task for good                              │
//! └────────────────────────────────────────────────────────────────────────────┘
//!          ▲ publish            ▲ publish              ▲ drain         ▲ drain
//! ┌────────┴────────────────────┴──────────────────────┴───────────────┴───────┐
//! │  Bus: Topic ──► [Inbox, Inbox, ...]   (per-subscriber FIFO, no shared state)│
//! └────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Event flow
//! ```text
//! CalendarService ── EventNext ───────────────────────────────► Display (bell)
//!                 ── EventStarted ──► AlarmController (ring)
//!                                  └────────────────────────► Display (clear bell)
//!                 ── CalendarError ───────────────────────────► Display (warning)
//! AlarmController ── SongName / Radio(Off) ───────────────────► Display (overlay)
//! input source    ── SilenceAlarm ──► AlarmController
//!                 ── RequestCalendarUpdate ──► CalendarService
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                                  |
//! |-------------------|----------------------------------------------------------|-----------------------------------------------------|
//! | **Scheduling**    | Cooperative tick loop with panic isolation.              | [`Scheduler`], [`Task`], [`TaskFn`], [`Clock`]      |
//! | **Events**        | Typed events routed by topic to per-service inboxes.     | [`Bus`], [`Inbox`], [`Event`], [`Topic`]            |
//! | **Services**      | Calendar polling, alarm playback, display refresh.       | [`CalendarService`], [`AlarmController`], [`DisplayCoordinator`] |
//! | **Adapters**      | Narrow traits for hardware and network collaborators.    | [`CalendarBackend`], [`AudioBackend`], [`DisplayDriver`] |
//! | **Errors**        | Typed errors per collaborator.                           | [`CalendarError`], [`AudioError`], [`DisplayError`] |
//! | **Configuration** | TOML file plus environment overrides.                    | [`Config`]                                          |
//!
//! ## Optional features
//! - `logging` (default): exports [`LogTap`], a service that logs every bus event.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use chrono::{DateTime, Utc};
//! use inkclock::{Bus, Continuation, Event, RadioState, Scheduler, TaskFn, Topic};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let bus = Bus::new();
//!     let mut inbox = bus.inbox("observer");
//!     bus.subscribe(&inbox, Topic::Radio);
//!
//!     let mut sched = Scheduler::new(Duration::from_secs(1));
//!     let publisher = bus.clone();
//!     sched.add(TaskFn::boxed("once", move |_now: DateTime<Utc>| {
//!         publisher.publish(Event::Radio(RadioState::On));
//!         Continuation::Stop
//!     }));
//!
//!     let report = sched.run_cycle(Utc::now()).await;
//!     assert_eq!(report.stopped, 1);
//!     assert_eq!(inbox.drain(), Some(Event::Radio(RadioState::On)));
//! }
//! ```
mod adapters;
mod config;
mod core;
mod error;
mod events;
mod services;
mod tasks;

pub mod testing;

// ---- Public re-exports ----

pub use adapters::{
    AudioBackend, Banner, CalendarBackend, ClockFace, Compositor, Credentials, DisplayDriver,
    FrameBuffer, NetworkPresence, Occurrence, Principal, RemoteCalendar, StreamMetadata,
    SysfsInterfaces, UNKNOWN_LABEL,
};
pub use config::{
    AlarmConfig, CalendarConfig, Config, DisplayConfig, ENV_CALENDAR_PASSWORD, ENV_CALENDAR_URL,
    ENV_CALENDAR_USERNAME, ENV_STREAM_URL, SchedulerConfig,
};
pub use core::{Clock, CycleReport, Scheduler, SchedulerExit, SystemClock};
pub use error::{AudioError, CalendarError, ConfigError, DisplayError};
pub use events::{AlarmOutcome, Bus, ButtonEdge, Event, Inbox, RadioState, Topic};
pub use services::{
    AlarmController, AlarmMode, CalendarService, CalendarState, DisplayCoordinator, DisplayState,
    RefreshMode, hhmm,
};
pub use tasks::{Continuation, Task, TaskBox, TaskFn};

// Optional: expose the event logger service.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use services::LogTap;
