//! # Run a single tick of a task.
//!
//! Executes one [`Task::tick`] and classifies the result for the scheduler.
//!
//! ## Flow
//! ```text
//! Ok(KeepRunning) ─► TickOutcome::Continue
//! Ok(Stop)        ─► TickOutcome::Stop      (deliberate, task is dropped)
//! panic           ─► TickOutcome::Faulted   (logged, task is kept)
//! ```
//!
//! ## Rules
//! - A fault is **never** converted into a stop: the task stays scheduled.
//! - The panic payload is logged with the task name; nothing is published.
//! - Shutdown hooks get the same isolation: one failing hook never skips the rest.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use chrono::{DateTime, Utc};
use futures::FutureExt;

use crate::tasks::Task;

/// Result of one tick, as seen by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickOutcome {
    Continue,
    Stop,
    Faulted,
}

/// Ticks `task` once, isolating panics.
pub(crate) async fn run_tick(task: &mut dyn Task, now: DateTime<Utc>) -> TickOutcome {
    let res = AssertUnwindSafe(task.tick(now)).catch_unwind().await;
    match res {
        Ok(next) if next.is_stop() => {
            tracing::info!(task = task.name(), "task requested stop");
            TickOutcome::Stop
        }
        Ok(_) => TickOutcome::Continue,
        Err(payload) => {
            tracing::error!(
                task = task.name(),
                panic = %panic_message(payload.as_ref()),
                "task panicked during tick; keeping it scheduled"
            );
            TickOutcome::Faulted
        }
    }
}

/// Runs the task's shutdown hook, isolating panics.
pub(crate) async fn run_shutdown(task: &mut dyn Task) {
    if let Err(payload) = AssertUnwindSafe(task.shutdown()).catch_unwind().await {
        tracing::error!(
            task = task.name(),
            panic = %panic_message(payload.as_ref()),
            "task panicked during shutdown"
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
