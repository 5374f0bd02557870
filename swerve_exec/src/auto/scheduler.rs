//! # Command scheduler
//!
//! Each scheduler tick:
//!
//! 1. Updates every active command which is due.
//! 2. Stops and removes every command which has finished.
//! 3. If no remaining command blocks the script, reads the next line,
//!    resolves it and starts the new command.
//! 4. If nothing is active and the script is exhausted, stops itself and
//!    cancels the run.
//!
//! Lines which fail to parse or resolve are logged and replaced by a `NoOp`,
//! so the routine carries on.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info, warn};
use serde::Serialize;

use util::script_interpreter::ScriptInterpreter;

use super::{Command, CommandCtx, CommandRegistry, NoOp};
use crate::tick::{CancelToken, Periodic};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct Scheduler {
    registry: CommandRegistry,

    ctx: CommandCtx,

    script: ScriptInterpreter,

    active: Vec<ActiveCommand>,

    cancel: CancelToken,

    state: SchedulerState,

    report: SchedulerReport
}

/// Counters describing the progress of the routine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SchedulerReport {
    /// Commands started, including substituted no-ops.
    pub num_started: usize,

    /// Commands which have finished and been removed.
    pub num_finished: usize,

    /// Lines which could not be parsed or resolved.
    pub num_failed_lines: usize
}

struct ActiveCommand {
    cmd: Box<dyn Command>,
    period_s: f64,
    next_due_s: f64
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchedulerState {
    /// Not yet ticked.
    Idle,

    Running,

    /// Routine complete or stopped. Terminal.
    Stopped
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Scheduler {
    pub fn new(
        registry: CommandRegistry,
        ctx: CommandCtx,
        script: ScriptInterpreter,
        cancel: CancelToken
    ) -> Self {
        Self {
            registry,
            ctx,
            script,
            active: Vec::new(),
            cancel,
            state: SchedulerState::Idle,
            report: SchedulerReport::default()
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn report(&self) -> SchedulerReport {
        self.report
    }

    /// Names of the active commands, in the order they were started.
    pub fn active_names(&self) -> Vec<&str> {
        self.active.iter().map(|a| a.cmd.name()).collect()
    }

    /// Run one scheduler tick.
    pub fn tick(&mut self, time_s: f64) {
        match self.state {
            SchedulerState::Stopped => return,
            SchedulerState::Idle => {
                info!(
                    "Starting routine of {} lines",
                    self.script.get_num_remaining()
                );
                self.state = SchedulerState::Running;
            },
            SchedulerState::Running => ()
        }

        // Update due commands
        for a in self.active.iter_mut() {
            if time_s >= a.next_due_s && !a.cmd.finished() {
                a.cmd.update(time_s);
                a.next_due_s += a.period_s;
                if a.next_due_s <= time_s {
                    a.next_due_s = time_s + a.period_s;
                }
            }
        }

        self.sweep_finished();

        let blocking_free = self.active.iter().all(|a| a.cmd.parallel());

        if blocking_free && self.script.has_next() {
            let cmd = self.next_command();
            self.start_command(cmd, time_s);
        }

        if self.active.is_empty() && !self.script.has_next() {
            info!(
                "Routine complete: {} commands run, {} lines failed",
                self.report.num_finished, self.report.num_failed_lines
            );
            self.stop();
        }
    }

    /// Stop every active command and the scheduler. Later calls have no
    /// effect.
    pub fn stop(&mut self) {
        if self.state == SchedulerState::Stopped {
            return;
        }

        for a in self.active.iter_mut() {
            info!("Stopping \"{}\"", a.cmd.name());
            a.cmd.stop();
        }
        self.active.clear();

        self.state = SchedulerState::Stopped;
        self.cancel.cancel();
    }

    fn sweep_finished(&mut self) {
        let mut i = 0;

        while i < self.active.len() {
            if self.active[i].cmd.finished() {
                let mut a = self.active.remove(i);
                a.cmd.stop();
                self.report.num_finished += 1;
                info!("\"{}\" finished", a.cmd.name());
            }
            else {
                i += 1;
            }
        }
    }

    /// Resolve the next script line, falling back to a `NoOp`.
    fn next_command(&mut self) -> Box<dyn Command> {
        let resolved = match self.script.next_line() {
            Some(Ok(line)) => self.registry
                .resolve(&self.ctx, &line)
                .map_err(|e| e.to_string()),
            Some(Err(e)) => Err(e.to_string()),
            None => Err("script exhausted".to_string())
        };

        match resolved {
            Ok(cmd) => cmd,
            Err(e) => {
                warn!("Could not resolve script line, skipping: {}", e);
                self.report.num_failed_lines += 1;
                Box::new(NoOp::new())
            }
        }
    }

    fn start_command(&mut self, mut cmd: Box<dyn Command>, time_s: f64) {
        let period_s = match cmd.period_s() {
            Some(p) if p.is_finite() && p > 0.0 => p,
            _ => self.ctx.params.command_period_s
        };

        info!(
            "Starting \"{}\"{}",
            cmd.name(),
            if cmd.parallel() { " in parallel" } else { "" }
        );
        debug!("{} lines remaining", self.script.get_num_remaining());

        cmd.start(time_s);
        self.report.num_started += 1;

        // First update on the next tick
        self.active.push(ActiveCommand {
            cmd,
            period_s,
            next_due_s: time_s
        });
    }
}

impl Periodic for Scheduler {
    fn name(&self) -> &str {
        "scheduler"
    }

    fn tick(&mut self, time_s: f64) {
        Scheduler::tick(self, time_s)
    }

    fn stop(&mut self) {
        Scheduler::stop(self)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
