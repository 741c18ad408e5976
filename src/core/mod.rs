//! Runtime core: the cooperative tick loop.
//!
//! The public API from this module is [`Scheduler`] plus the [`Clock`] it
//! reads.
//!
//! Internal modules:
//! - [`scheduler`]: owns the task queue, runs cycles, sleeps the quantum;
//! - [`runner`]: ticks one task and isolates panics;
//! - [`clock`]: wall-clock source handed to every tick.

mod clock;
mod runner;
mod scheduler;

pub use clock::{Clock, SystemClock};
pub use scheduler::{CycleReport, Scheduler, SchedulerExit};
