//! # Scheduler: cooperative round-robin driver for long-lived tasks.
//!
//! The [`Scheduler`] owns an ordered queue of [`Task`](crate::Task)s, ticks each
//! one once per cycle and sleeps a fixed quantum between cycles.
//!
//! ## Cycle
//! ```text
//! n = queue.len()                      (snapshot: re-enqueued tasks wait for next cycle)
//! repeat n times:
//!   task = queue.pop_front()
//!   runner::run_tick(task, now)
//!     ├─ Continue ─► queue.push_back(task)
//!     ├─ Faulted  ─► queue.push_back(task)   (panic logged, never a stop)
//!     └─ Stop     ─► drop(task)              (permanent)
//! sleep(quantum)  (cancellable)
//! ```
//!
//! ## Exit conditions
//! - queue is empty ─► [`SchedulerExit::Drained`]
//! - shutdown token cancelled ─► every live task's `shutdown` hook, then
//!   [`SchedulerExit::Cancelled`]; the tasks stay queued
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use inkclock::{Continuation, Scheduler, SchedulerExit, SystemClock, TaskFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let mut sched = Scheduler::new(Duration::from_millis(1));
//!     let mut ticks = 0;
//!     sched.add(TaskFn::boxed("three-ticks", move |_now| {
//!         ticks += 1;
//!         if ticks == 3 { Continuation::Stop } else { Continuation::KeepRunning }
//!     }));
//!
//!     let exit = sched.run(&SystemClock, CancellationToken::new()).await;
//!     assert_eq!(exit, SchedulerExit::Drained);
//! }
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::core::clock::Clock;
use crate::core::runner::{TickOutcome, run_shutdown, run_tick};
use crate::tasks::TaskBox;

/// Per-cycle counters returned by [`Scheduler::run_cycle`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Tasks ticked in this cycle.
    pub ticked: usize,
    /// Tasks that returned `Stop` and were removed.
    pub stopped: usize,
    /// Tasks whose tick panicked (still scheduled).
    pub faulted: usize,
}

/// Why [`Scheduler::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerExit {
    /// Every task stopped.
    Drained,
    /// The shutdown token was cancelled.
    Cancelled,
}

/// Cooperative single-threaded task driver.
pub struct Scheduler {
    tasks: VecDeque<TaskBox>,
    quantum: Duration,
}

impl Scheduler {
    /// Creates an empty scheduler sleeping `quantum` between cycles.
    pub fn new(quantum: Duration) -> Self {
        Self {
            tasks: VecDeque::new(),
            quantum,
        }
    }

    /// Appends a task at the back of the queue.
    pub fn add(&mut self, task: TaskBox) {
        tracing::debug!(task = task.name(), "task registered");
        self.tasks.push_back(task);
    }

    /// Number of live tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True if no task is left.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Names of live tasks in queue order.
    pub fn task_names(&self) -> Vec<String> {
        self.tasks.iter().map(|t| t.name().to_string()).collect()
    }

    /// Sleep between cycles.
    pub fn quantum(&self) -> Duration {
        self.quantum
    }

    /// Ticks every task currently queued exactly once.
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> CycleReport {
        let mut report = CycleReport::default();
        let n = self.tasks.len();

        for _ in 0..n {
            let Some(mut task) = self.tasks.pop_front() else {
                break;
            };
            report.ticked += 1;

            match run_tick(task.as_mut(), now).await {
                TickOutcome::Continue => self.tasks.push_back(task),
                TickOutcome::Faulted => {
                    report.faulted += 1;
                    self.tasks.push_back(task);
                }
                TickOutcome::Stop => report.stopped += 1,
            }
        }
        report
    }

    /// Runs every live task's [`Task::shutdown`](crate::Task::shutdown) hook in queue order.
    pub async fn shutdown(&mut self) {
        for task in self.tasks.iter_mut() {
            run_shutdown(task.as_mut()).await;
        }
    }

    /// Runs cycles until every task has stopped or `shutdown` is cancelled.
    ///
    /// The token is checked before each cycle and raced against the
    /// inter-cycle sleep; a cycle in progress always completes. On
    /// cancellation the tasks' shutdown hooks run before returning.
    pub async fn run(&mut self, clock: &dyn Clock, shutdown: CancellationToken) -> SchedulerExit {
        let mut cycle: u64 = 0;

        loop {
            if self.tasks.is_empty() {
                tracing::info!(cycles = cycle, "all tasks stopped");
                return SchedulerExit::Drained;
            }
            if shutdown.is_cancelled() {
                break;
            }

            cycle += 1;
            let report = self.run_cycle(clock.now()).await;
            tracing::trace!(
                cycle,
                ticked = report.ticked,
                stopped = report.stopped,
                faulted = report.faulted,
                "cycle complete"
            );

            let sleep = time::sleep(self.quantum);
            tokio::pin!(sleep);
            select! {
                _ = &mut sleep => {}
                _ = shutdown.cancelled() => { break; }
            }
        }

        tracing::info!(cycles = cycle, live = self.tasks.len(), "scheduler cancelled");
        self.shutdown().await;
        SchedulerExit::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::core::clock::SystemClock;
    use crate::tasks::{Continuation, TaskFn};

    fn counting(name: &'static str, hits: Arc<AtomicUsize>, stop_after: Option<usize>) -> TaskBox {
        TaskFn::boxed(name, move |_now| {
            let n = hits.fetch_add(1, Ordering::SeqCst) + 1;
            match stop_after {
                Some(limit) if n >= limit => Continuation::Stop,
                _ => Continuation::KeepRunning,
            }
        })
    }

    #[tokio::test]
    async fn keep_running_task_ticks_once_per_cycle() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut sched = Scheduler::new(Duration::from_secs(1));
        sched.add(counting("forever", hits.clone(), None));

        for cycle in 1..=5 {
            let report = sched.run_cycle(Utc::now()).await;
            assert_eq!(report.ticked, 1);
            assert_eq!(hits.load(Ordering::SeqCst), cycle);
        }
        assert_eq!(sched.len(), 1);
    }

    #[tokio::test]
    async fn stopped_task_is_never_ticked_again() {
        let stopper = Arc::new(AtomicUsize::new(0));
        let runner = Arc::new(AtomicUsize::new(0));
        let mut sched = Scheduler::new(Duration::from_secs(1));
        sched.add(counting("stopper", stopper.clone(), Some(2)));
        sched.add(counting("runner", runner.clone(), None));

        let first = sched.run_cycle(Utc::now()).await;
        assert_eq!(first.stopped, 0);
        let second = sched.run_cycle(Utc::now()).await;
        assert_eq!(second.stopped, 1);
        assert_eq!(sched.len(), 1);

        for _ in 0..3 {
            sched.run_cycle(Utc::now()).await;
        }
        assert_eq!(stopper.load(Ordering::SeqCst), 2);
        assert_eq!(runner.load(Ordering::SeqCst), 5);
        assert_eq!(sched.task_names(), vec!["runner".to_string()]);
    }

    #[tokio::test]
    async fn round_robin_keeps_registration_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut sched = Scheduler::new(Duration::from_secs(1));
        for name in ["a", "b", "c"] {
            let order = order.clone();
            sched.add(TaskFn::boxed(name, move |_now| {
                order.lock().unwrap().push(name);
                Continuation::KeepRunning
            }));
        }

        sched.run_cycle(Utc::now()).await;
        sched.run_cycle(Utc::now()).await;
        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c", "a", "b", "c"]);
    }

    #[tokio::test]
    async fn panicking_tick_is_absorbed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let mut sched = Scheduler::new(Duration::from_secs(1));
        sched.add(TaskFn::boxed("flaky", move |_now| {
            if c.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("boom");
            }
            Continuation::KeepRunning
        }));

        let first = sched.run_cycle(Utc::now()).await;
        assert_eq!(first.faulted, 1);
        assert_eq!(first.stopped, 0);
        assert_eq!(sched.len(), 1);

        let second = sched.run_cycle(Utc::now()).await;
        assert_eq!(second.faulted, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn run_sleeps_one_quantum_between_cycles() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut sched = Scheduler::new(Duration::from_secs(1));
        sched.add(counting("three", hits.clone(), Some(3)));

        let started = time::Instant::now();
        let exit = sched.run(&SystemClock, CancellationToken::new()).await;

        assert_eq!(exit, SchedulerExit::Drained);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(3), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_secs(4), "elapsed {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_ends_the_run() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut sched = Scheduler::new(Duration::from_secs(1));
        sched.add(counting("forever", hits.clone(), None));

        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(2500)).await;
            trigger.cancel();
        });

        let exit = sched.run(&SystemClock, token).await;
        assert_eq!(exit, SchedulerExit::Cancelled);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(sched.len(), 1);
    }

    struct Parked {
        released: Arc<AtomicUsize>,
        explode: bool,
    }

    #[async_trait::async_trait]
    impl crate::tasks::Task for Parked {
        fn name(&self) -> &str {
            "parked"
        }

        async fn tick(&mut self, _now: DateTime<Utc>) -> Continuation {
            Continuation::KeepRunning
        }

        async fn shutdown(&mut self) {
            if self.explode {
                panic!("release failed");
            }
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_runs_shutdown_hooks_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let mut sched = Scheduler::new(Duration::from_secs(1));
        sched.add(Box::new(Parked {
            released: released.clone(),
            explode: true,
        }));
        sched.add(Box::new(Parked {
            released: released.clone(),
            explode: false,
        }));

        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(1500)).await;
            trigger.cancel();
        });

        assert_eq!(sched.run(&SystemClock, token).await, SchedulerExit::Cancelled);
        // the first hook panics; the second still runs
        assert_eq!(released.load(Ordering::SeqCst), 1);
        assert_eq!(sched.task_names(), vec!["parked", "parked"]);
    }
}
