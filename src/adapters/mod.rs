//! Contracts for the hardware and network collaborators.
//!
//! The services only call these traits; concrete drivers live outside the
//! core (see `demos/headless.rs` for console stand-ins).
//!
//! ## Contents
//! - [`CalendarBackend`] authenticate / list calendars / search occurrences
//! - [`AudioBackend`] play / stop / volume / stream metadata
//! - [`DisplayDriver`], [`Compositor`] panel primitives and face rendering
//! - [`NetworkPresence`] non-loopback link check ([`SysfsInterfaces`])

mod audio;
mod calendar;
mod display;
mod network;

pub use audio::{AudioBackend, StreamMetadata, UNKNOWN_LABEL};
pub use calendar::{CalendarBackend, Credentials, Occurrence, Principal, RemoteCalendar};
pub use display::{Banner, ClockFace, Compositor, DisplayDriver, FrameBuffer};
pub use network::{NetworkPresence, SysfsInterfaces};
