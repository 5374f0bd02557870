//! Parameters structure for SwerveCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::{HeadingSensorParams, SwerveCtrlError, NUM_MODULES};
use crate::pid::PidGains;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for swerve control.
#[derive(Debug, Clone, Deserialize)]
pub struct SwerveCtrlParams {

    // ---- GEOMETRY ----

    /// Distance between the front and back module axes.
    ///
    /// Units: distance units (same as the drive encoders)
    pub length: f64,

    /// Distance between the left and right module axes.
    ///
    /// Units: distance units
    pub width: f64,

    /// Position of the centre of rotation relative to the geometric centre
    /// of the modules, as `[x, y]`.
    ///
    /// Units: distance units
    #[serde(default)]
    pub centre_of_rotation: [f64; 2],

    // ---- CONTROL ----

    /// Period at which the chassis (and its modules) are ticked.
    ///
    /// Units: seconds
    pub period_s: f64,

    /// Gains of the module steering controllers.
    pub steer_gains: PidGains,

    // ---- STEER ENCODERS ----

    /// Steer encoder characteristics, shared by all modules.
    pub steer_encoder: HeadingSensorParams,

    /// Calibration offsets of each module's steer encoder, in module order.
    ///
    /// Units: degrees
    #[serde(default)]
    pub steer_offsets_deg: [f64; NUM_MODULES],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SwerveCtrlParams {
    /// Check the parameters describe a chassis that can be controlled.
    pub fn validate(&self) -> Result<(), SwerveCtrlError> {
        if !(self.length.is_finite() && self.length > 0.0)
            || !(self.width.is_finite() && self.width > 0.0)
        {
            return Err(SwerveCtrlError::InvalidGeometry(format!(
                "length ({}) and width ({}) must be positive",
                self.length, self.width
            )));
        }

        if !self.centre_of_rotation.iter().all(|c| c.is_finite()) {
            return Err(SwerveCtrlError::InvalidGeometry(format!(
                "centre of rotation {:?} is not finite",
                self.centre_of_rotation
            )));
        }

        if !(self.period_s.is_finite() && self.period_s > 0.0) {
            return Err(SwerveCtrlError::InvalidPeriod(self.period_s));
        }

        self.steer_encoder.validate()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_params_file() {
        let params: SwerveCtrlParams = util::params::from_str(
            include_str!("../../../params/swerve_ctrl.toml")
        ).unwrap();

        params.validate().unwrap();
        assert_eq!(params.steer_offsets_deg, [0.0; NUM_MODULES]);
    }

    #[test]
    fn test_validate() {
        let mut params: SwerveCtrlParams = util::params::from_str(
            include_str!("../../../params/swerve_ctrl.toml")
        ).unwrap();

        params.period_s = -0.02;
        assert!(matches!(params.validate(), Err(SwerveCtrlError::InvalidPeriod(_))));

        params.period_s = 0.02;
        params.steer_encoder.max_voltage = params.steer_encoder.min_voltage;
        assert!(matches!(params.validate(), Err(SwerveCtrlError::InvalidEncoderParams(_))));
    }
}
