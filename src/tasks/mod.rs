//! # Task abstractions.
//!
//! This module provides the core task-related types:
//! - [`Task`] - trait for a cooperative, tick-driven unit of work
//! - [`Continuation`] - keep-running / stop signal returned by every tick
//! - [`TaskFn`] - closure-based task implementation
//! - [`TaskBox`] - owned task handle (`Box<dyn Task>`)

mod task;
mod task_fn;

pub use task::{Continuation, Task, TaskBox};
pub use task_fn::TaskFn;
