//! Bus events: types and topic router.
//!
//! This module groups the event **data model** and the **bus** used by the
//! clock services to talk to each other without sharing state.
//!
//! ## Contents
//! - [`Event`], [`Topic`] tagged payloads and their routing keys
//! - [`ButtonEdge`], [`RadioState`], [`AlarmOutcome`] payload enums
//! - [`Bus`], [`Inbox`] topic registry and per-subscriber FIFO queues
//!
//! ## Quick reference
//! - **Publishers**: `CalendarService`, `AlarmController`, the input source.
//! - **Consumers**: every service drains its own [`Inbox`] at the start of
//!   its tick.

mod bus;
mod event;

pub use bus::{Bus, Inbox};
pub use event::{AlarmOutcome, ButtonEdge, Event, RadioState, Topic};
