//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: FnMut(DateTime<Utc>) -> Continuation`,
//! calling it once per tick. State lives in the closure's captures.
//!
//! ## Example
//! ```rust
//! use inkclock::{Continuation, Task, TaskBox, TaskFn};
//!
//! let mut left = 3;
//! let t: TaskBox = TaskFn::boxed("countdown", move |_now| {
//!     left -= 1;
//!     if left == 0 { Continuation::Stop } else { Continuation::KeepRunning }
//! });
//! assert_eq!(t.name(), "countdown");
//! ```

use std::borrow::Cow;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::tasks::task::{Continuation, Task, TaskBox};

/// Function-backed task implementation.
#[derive(Debug)]
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::boxed`] when you immediately need a [`TaskBox`].
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }
}

impl<F> TaskFn<F>
where
    F: FnMut(DateTime<Utc>) -> Continuation + Send + 'static,
{
    /// Creates the task and returns it as an owned handle.
    pub fn boxed(name: impl Into<Cow<'static, str>>, f: F) -> TaskBox {
        Box::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F> Task for TaskFn<F>
where
    F: FnMut(DateTime<Utc>) -> Continuation + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn tick(&mut self, now: DateTime<Utc>) -> Continuation {
        (self.f)(now)
    }
}
