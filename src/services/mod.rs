//! The clock's cooperative services.
//!
//! Each service is a [`Task`](crate::Task) that owns one collaborator and an
//! [`Inbox`](crate::Inbox) on the shared [`Bus`](crate::Bus):
//!
//! - [`CalendarService`] polls the calendar and announces occurrences.
//! - [`AlarmController`] rings, silences and toggles playback.
//! - [`DisplayCoordinator`] redraws the panel.
//! - [`LogTap`] logs every bus event (feature `logging`).

mod alarm;
mod calendar;
mod display;
#[cfg(feature = "logging")]
mod log;

pub use alarm::{AlarmController, AlarmMode};
pub use calendar::{CalendarService, CalendarState};
pub use display::{DisplayCoordinator, DisplayState, RefreshMode, hhmm};
#[cfg(feature = "logging")]
pub use log::LogTap;
