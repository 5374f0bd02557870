//! General time utility functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A source of monotonic time, in seconds since some fixed epoch.
pub trait Clock {
    /// Current time in seconds.
    fn now_s(&self) -> f64;

    /// Block until the clock reads at least `time_s`.
    fn sleep_until(&self, time_s: f64);
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Clock reading the session elapsed time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SessionClock;

/// Clock which only moves when told to. Sleeping jumps straight to the
/// requested time.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    time_s: Arc<Mutex<f64>>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Clock for SessionClock {
    fn now_s(&self) -> f64 {
        crate::session::get_elapsed_seconds()
    }

    fn sleep_until(&self, time_s: f64) {
        let remaining_s = time_s - self.now_s();

        if remaining_s > 0.0 {
            thread::sleep(Duration::from_secs_f64(remaining_s));
        }
    }
}

impl ManualClock {
    pub fn new(time_s: f64) -> Self {
        Self {
            time_s: Arc::new(Mutex::new(time_s))
        }
    }

    /// Move the clock forward by `dt_s` seconds.
    pub fn advance(&self, dt_s: f64) {
        let mut t = self.time_s.lock().unwrap_or_else(|e| e.into_inner());
        *t += dt_s;
    }
}

impl Clock for ManualClock {
    fn now_s(&self) -> f64 {
        *self.time_s.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn sleep_until(&self, time_s: f64) {
        let mut t = self.time_s.lock().unwrap_or_else(|e| e.into_inner());
        if time_s > *t {
            *t = time_s;
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}
