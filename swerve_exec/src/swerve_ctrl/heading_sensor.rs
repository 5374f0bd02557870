//! Module steer heading sensor
//!
//! Fuses the bounded absolute steer reading with the turn counter to give a
//! continuous module heading. Calibration stores the offset so that the
//! current steer position reads as zero.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::info;
use serde::{Deserialize, Serialize};

use util::maths::{lin_map, norm_deg, rem_euclid};

use super::SwerveCtrlError;
use crate::eqpt::SteerEncoder;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default wheel degrees covered by one full turn of the absolute sensor.
pub const DEFAULT_DEG_PER_ROTATION: f64 = 102.857142857;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Characteristics of a steer encoder.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct HeadingSensorParams {
    /// Voltage at the bottom of the absolute sensor's range.
    pub min_voltage: f64,

    /// Voltage at the top of the absolute sensor's range.
    pub max_voltage: f64,

    /// Wheel degrees covered by one full turn of the absolute sensor.
    #[serde(default = "default_deg_per_rotation")]
    pub deg_per_rotation: f64
}

/// Heading sensor of a single module.
pub struct HeadingSensor {
    encoder: Box<dyn SteerEncoder>,

    params: HeadingSensorParams,

    /// Offset subtracted from the raw heading.
    offset_deg: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl HeadingSensorParams {
    pub fn validate(&self) -> Result<(), SwerveCtrlError> {
        if !(self.min_voltage.is_finite() && self.max_voltage.is_finite())
            || self.max_voltage <= self.min_voltage
        {
            return Err(SwerveCtrlError::InvalidEncoderParams(format!(
                "voltage range ({}, {}) is empty",
                self.min_voltage, self.max_voltage
            )));
        }

        if !(self.deg_per_rotation.is_finite() && self.deg_per_rotation > 0.0) {
            return Err(SwerveCtrlError::InvalidEncoderParams(format!(
                "degrees per rotation ({}) must be positive",
                self.deg_per_rotation
            )));
        }

        Ok(())
    }
}

impl Default for HeadingSensorParams {
    fn default() -> Self {
        Self {
            min_voltage: 0.0,
            max_voltage: 5.0,
            deg_per_rotation: DEFAULT_DEG_PER_ROTATION
        }
    }
}

impl HeadingSensor {
    /// Create a new sensor using a previously found calibration offset.
    pub fn new(
        encoder: Box<dyn SteerEncoder>,
        params: HeadingSensorParams,
        offset_deg: f64
    ) -> Self {
        Self {
            encoder,
            params,
            offset_deg
        }
    }

    /// Module heading in degrees, in `[0, 360)`.
    pub fn heading_deg(&self) -> f64 {
        norm_deg(self.raw_deg() - self.offset_deg)
    }

    /// The heading before the offset is applied.
    pub fn raw_deg(&self) -> f64 {
        self.encoder.turn_count() as f64 * self.params.deg_per_rotation
            + self.absolute_deg()
    }

    /// Take the current steer position as zero.
    ///
    /// Returns the new offset, which should be persisted by the caller so
    /// that it can be passed back in at the next start.
    pub fn calibrate(&mut self) -> f64 {
        self.offset_deg = self.absolute_deg();
        self.encoder.reset_turn_count();

        info!("Steer encoder calibrated, offset is now {:.3} deg", self.offset_deg);

        self.offset_deg
    }

    /// Add a trim to the current offset.
    pub fn trim_center(&mut self, trim_deg: f64) {
        if trim_deg.is_finite() {
            self.offset_deg += trim_deg;
        }
    }

    /// Last absolute reading, in volts.
    pub fn raw_voltage(&self) -> f64 {
        self.encoder.voltage()
    }

    pub fn offset_deg(&self) -> f64 {
        self.offset_deg
    }

    /// The absolute sensor reading mapped into wheel degrees.
    fn absolute_deg(&self) -> f64 {
        let dpr = self.params.deg_per_rotation;

        let deg = lin_map(
            (self.params.min_voltage, self.params.max_voltage),
            (0.0, dpr),
            self.encoder.voltage()
        );

        // Voltages sitting slightly outside the nominal range wrap around
        rem_euclid(deg, dpr)
    }
}

fn default_deg_per_rotation() -> f64 {
    DEFAULT_DEG_PER_ROTATION
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
