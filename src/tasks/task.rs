//! # Task abstraction.
//!
//! This module defines the [`Task`] trait (one async step per scheduler cycle)
//! and the [`Continuation`] each step returns. The common handle type is
//! [`TaskBox`], a `Box<dyn Task>` owned exclusively by the scheduler.
//!
//! A task must run its tick to completion without waiting on anything other
//! than the adapter calls it makes; the scheduler is the only place that sleeps.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// What the scheduler should do with a task after its tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Re-enqueue the task for the next cycle.
    KeepRunning,
    /// Remove the task permanently.
    ///
    /// Reserved for deliberate shutdown. Failures inside a tick are reported
    /// on the bus and answered with [`Continuation::KeepRunning`].
    Stop,
}

impl Continuation {
    /// True for [`Continuation::Stop`].
    #[inline]
    pub fn is_stop(&self) -> bool {
        matches!(self, Continuation::Stop)
    }
}

/// # Cooperative unit driven by the [`Scheduler`](crate::Scheduler).
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use chrono::{DateTime, Utc};
/// use inkclock::{Continuation, Task};
///
/// struct Heartbeat { beats: u64 }
///
/// #[async_trait]
/// impl Task for Heartbeat {
///     fn name(&self) -> &str { "heartbeat" }
///
///     async fn tick(&mut self, _now: DateTime<Utc>) -> Continuation {
///         self.beats += 1;
///         Continuation::KeepRunning
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Performs one step of work at wall-clock time `now`.
    async fn tick(&mut self, now: DateTime<Utc>) -> Continuation;

    /// Releases hardware before the process exits.
    ///
    /// Called once per live task when the scheduler is cancelled. The default
    /// does nothing.
    async fn shutdown(&mut self) {}
}

/// Owned task handle held by the scheduler.
pub type TaskBox = Box<dyn Task>;
