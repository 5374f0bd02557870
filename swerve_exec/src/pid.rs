//! # Feedback controller
//!
//! A discrete PID controller ticked at a fixed period. The integral term
//! accumulates a fixed fraction of the error every tick and is clamped to
//! `[-INTEGRAL_LIMIT, INTEGRAL_LIMIT]` so that a sustained error cannot wind
//! it up. The derivative term is the change in error since the last tick.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;
use serde::{Deserialize, Serialize};
use util::maths::clamp;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Fraction of the error added to the integral accumulator each tick.
pub const INTEGRAL_STEP: f64 = 0.3;

/// Limit on the magnitude of the integral accumulator.
pub const INTEGRAL_LIMIT: f64 = 9.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Gains for a PID controller, as found in parameter files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64
}

/// A PID controller
#[derive(Debug, Clone, Default, Serialize)]
pub struct PidController {
    gains: PidGains,

    /// The integral accumulation
    integral: f64,

    /// Previous error
    prev_error: f64,

    /// Output of the last update
    output: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidGains {
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self { k_p, k_i, k_d }
    }
}

impl PidController {

    /// Create a new controller with the given gains.
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            ..Default::default()
        }
    }

    /// Replace the gains, keeping the accumulated state.
    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    /// Feed a new error sample into the controller and get the new output.
    ///
    /// Non-finite errors are dropped and the previous output is returned.
    pub fn update(&mut self, error: f64) -> f64 {
        if !error.is_finite() {
            debug!("Non-finite error {} ignored by PID controller", error);
            return self.output;
        }

        self.integral = clamp(
            self.integral + error * INTEGRAL_STEP,
            -INTEGRAL_LIMIT,
            INTEGRAL_LIMIT
        );

        let deriv = error - self.prev_error;

        self.output = 
            self.gains.k_p * error 
            + self.gains.k_i * self.integral 
            + self.gains.k_d * deriv;

        self.prev_error = error;

        self.output
    }

    /// Output of the last update.
    pub fn output(&self) -> f64 {
        self.output
    }

    /// The clamped integral accumulator.
    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn prev_error(&self) -> f64 {
        self.prev_error
    }

    /// Zero the accumulated error, previous error and output.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = 0.0;
        self.output = 0.0;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
