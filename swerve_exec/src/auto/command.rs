//! Command interface

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A command in an autonomous routine.
///
/// The scheduler calls `start` once, `update` periodically until `finished`
/// returns true, then `stop` once. Implementations must still tolerate `stop`
/// being called more than once.
pub trait Command: Send {
    /// Name of the command for logging.
    fn name(&self) -> &str;

    /// Begin the command at `time_s`.
    fn start(&mut self, time_s: f64);

    /// Run one update of the command.
    fn update(&mut self, time_s: f64);

    /// True once the command has completed. Must not have side effects.
    fn finished(&self) -> bool;

    /// Parallel commands do not block the script from advancing.
    fn parallel(&self) -> bool {
        false
    }

    /// Update period for this command, `None` for the scheduler's default.
    fn period_s(&self) -> Option<f64> {
        None
    }

    fn stop(&mut self);
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A command which does nothing and finishes on its first update.
///
/// Stands in for script lines which could not be resolved.
#[derive(Debug, Default)]
pub struct NoOp {
    finished: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl NoOp {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Command for NoOp {
    fn name(&self) -> &str {
        "noop"
    }

    fn start(&mut self, _time_s: f64) {}

    fn update(&mut self, _time_s: f64) {
        self.finished = true;
    }

    fn finished(&self) -> bool {
        self.finished
    }

    fn stop(&mut self) {}
}
