//! Motion requests and module demands passed through SwerveCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A robot-level motion request, relative to the chassis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RobotMotionVector {
    /// Translation speed. Normally in `[0, 1]`.
    pub speed: f64,

    /// Direction of translation in degrees.
    pub heading_deg: f64,

    /// Rotation rate, positive clockwise.
    pub rotation: f64
}

/// The latest drive request made through the drivetrain handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DriveDemand {
    /// The requested motion
    pub motion: RobotMotionVector,

    /// If true the motion heading is relative to the field
    pub field_centric: bool,

    /// Emergency tank driving: modules are put in override, the speed and
    /// rotation are mixed into left/right drive demands.
    pub emergency_tank: bool
}

/// Speed and heading demand for a single module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ModuleVector {
    /// Normalised module speed.
    pub speed: f64,

    /// Module heading in degrees, in `[0, 360)`.
    pub heading_deg: f64
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Demand passed to a module each tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum ModuleDemand {
    /// Closed-loop steering to the heading, open-loop drive at the speed.
    Drive(ModuleVector),

    /// Raw actuator demands, bypassing both loops.
    Override {
        steer: f64,
        speed: f64
    }
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RobotMotionVector {
    pub fn new(speed: f64, heading_deg: f64, rotation: f64) -> Self {
        Self { speed, heading_deg, rotation }
    }

    /// True if every field is a finite number.
    pub fn is_finite(&self) -> bool {
        self.speed.is_finite() && self.heading_deg.is_finite() && self.rotation.is_finite()
    }
}

impl Default for ModuleDemand {
    fn default() -> Self {
        ModuleDemand::Drive(ModuleVector::default())
    }
}
