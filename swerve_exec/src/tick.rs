//! # Periodic task runner
//!
//! Every periodic activity in the executive (chassis control, the command
//! scheduler, loopback equipment) is an entry in a single `Ticker` table with
//! its own period and next due time. The ticker is stepped from one thread and
//! runs until its `CancelToken` is set.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc
};

use log::{debug, info, trace, warn};
use serde::Serialize;

use util::time::Clock;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A task which is ticked periodically.
pub trait Periodic: Send {
    /// Name used in log messages.
    fn name(&self) -> &str;

    /// Run one tick of the task at the given time.
    fn tick(&mut self, time_s: f64);

    /// Stop the task. Must be safe to call more than once.
    fn stop(&mut self);
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Cancellation token shared between the ticker and whatever may stop it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

/// Table of periodic tasks.
pub struct Ticker {
    entries: Vec<Entry>,

    cancel: CancelToken,

    stopped: bool
}

/// Summary of a call to `Ticker::run`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RunSummary {
    /// Number of steps taken.
    pub num_steps: u64,

    /// True if the run ended because the token was cancelled, false if the
    /// step limit was hit.
    pub cancelled: bool,

    /// Time of the last step.
    pub end_time_s: f64
}

struct Entry {
    task: Box<dyn Periodic>,

    period_s: f64,

    /// `None` until the first tick, which happens on the first step.
    next_due_s: Option<f64>,

    num_overruns: u64
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TickError {
    #[error("Invalid period {1} s for task \"{0}\", must be positive")]
    InvalidPeriod(String, f64)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl Ticker {
    pub fn new(cancel: CancelToken) -> Self {
        Self {
            entries: Vec::new(),
            cancel,
            stopped: false
        }
    }

    /// Add a task to the table. Tasks are ticked in the order they are added.
    pub fn add(&mut self, task: Box<dyn Periodic>, period_s: f64) -> Result<(), TickError> {
        if !(period_s.is_finite() && period_s > 0.0) {
            return Err(TickError::InvalidPeriod(task.name().to_string(), period_s));
        }

        debug!("Added task \"{}\" with period {} s", task.name(), period_s);

        self.entries.push(Entry {
            task,
            period_s,
            next_due_s: None,
            num_overruns: 0
        });

        Ok(())
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn num_tasks(&self) -> usize {
        self.entries.len()
    }

    /// Tick every task which is due at `now_s`, returning the number ticked.
    ///
    /// A task which has fallen more than a period behind is rescheduled from
    /// `now_s` rather than ticked repeatedly to catch up.
    pub fn step(&mut self, now_s: f64) -> usize {
        let mut num_ticked = 0;

        for entry in self.entries.iter_mut() {
            if let Some(due) = entry.next_due_s {
                if now_s < due {
                    continue;
                }
            }

            trace!("Ticking \"{}\" at {:.3} s", entry.task.name(), now_s);
            entry.task.tick(now_s);
            num_ticked += 1;

            let mut next = match entry.next_due_s {
                Some(due) => due + entry.period_s,
                None => now_s + entry.period_s
            };

            if next <= now_s {
                entry.num_overruns += 1;
                warn!(
                    "Task \"{}\" overran, {:.3} s behind schedule ({} overruns)",
                    entry.task.name(),
                    now_s - next,
                    entry.num_overruns
                );
                next = now_s + entry.period_s;
            }

            entry.next_due_s = Some(next);
        }

        num_ticked
    }

    /// The earliest time any task is next due, or `None` if a task has never
    /// been ticked (or the table is empty).
    pub fn next_due_s(&self) -> Option<f64> {
        let mut earliest: Option<f64> = None;

        for entry in self.entries.iter() {
            let due = entry.next_due_s?;
            earliest = Some(earliest.map_or(due, |e| e.min(due)));
        }

        earliest
    }

    /// Step the table until the cancel token is set or `max_steps` steps
    /// have been taken, then stop every task.
    pub fn run(&mut self, clock: &dyn Clock, max_steps: Option<u64>) -> RunSummary {
        let mut summary = RunSummary::default();

        loop {
            if self.cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            if let Some(max) = max_steps {
                if summary.num_steps >= max {
                    warn!("Step limit of {} reached before the run finished", max);
                    break;
                }
            }

            let now_s = clock.now_s();
            self.step(now_s);
            summary.num_steps += 1;
            summary.end_time_s = now_s;

            if let Some(due) = self.next_due_s() {
                clock.sleep_until(due);
            }
        }

        self.stop();

        info!(
            "Ticker finished after {} steps at {:.3} s",
            summary.num_steps, summary.end_time_s
        );

        summary
    }

    /// Stop every task and cancel the token. Later calls have no effect.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }

        for entry in self.entries.iter_mut() {
            debug!("Stopping \"{}\"", entry.task.name());
            entry.task.stop();
        }

        self.cancel.cancel();
        self.stopped = true;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
