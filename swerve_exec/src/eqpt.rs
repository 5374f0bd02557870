//! # Equipment interfaces
//!
//! Traits describing the equipment the swerve software drives and senses.
//! Raw driver wrappers implement these at the boundary of the software, the
//! control code only ever sees the traits. `crate::loopback` provides ideal
//! implementations for dry runs and tests.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::loc::Pose2D;

// ---------------------------------------------------------------------------
// ACTUATORS AND SENSORS
// ---------------------------------------------------------------------------

/// A motor output taking a normalised demand in `[-1, 1]`.
pub trait MotorOutput: Send {
    fn set(&mut self, demand: f64);
}

/// The steering encoder of a module.
///
/// The encoder is made of a bounded absolute sensor which covers less than
/// one turn of the wheel, plus an up/down counter of the full turns of that
/// absolute sensor.
pub trait SteerEncoder: Send {
    /// Absolute reading, in volts.
    fn voltage(&self) -> f64;

    /// Number of full turns of the absolute sensor since the last reset.
    fn turn_count(&self) -> i64;

    /// Zero the turn counter.
    fn reset_turn_count(&mut self);
}

/// The drive (wheel) encoder of a module.
pub trait DriveEncoder: Send {
    /// Cumulative distance travelled by the wheel since the last reset.
    fn distance(&self) -> f64;

    fn reset(&mut self);
}

/// The chassis orientation sensor.
pub trait OrientationSensor: Send {
    /// Absolute yaw in degrees, or `None` if the sensor is unavailable.
    fn yaw_deg(&mut self) -> Option<f64>;

    /// True while the sensor is still calibrating itself.
    fn is_calibrating(&self) -> bool;

    /// Zero the yaw at the current orientation.
    fn zero_yaw(&mut self);
}

/// All the equipment belonging to one swerve module.
pub struct ModuleEqpt {
    pub steer_encoder: Box<dyn SteerEncoder>,
    pub drive_encoder: Box<dyn DriveEncoder>,
    pub steer_motor: Box<dyn MotorOutput>,
    pub drive_motor: Box<dyn MotorOutput>
}

// ---------------------------------------------------------------------------
// SUBSYSTEMS
// ---------------------------------------------------------------------------

/// The drivetrain as seen by commands.
pub trait Drivetrain: Send + Sync {
    /// Request a robot-level motion.
    ///
    /// - `speed`: translation speed in `[0, 1]`
    /// - `heading_deg`: direction of translation
    /// - `rotation`: rotation rate, positive clockwise
    /// - `field_centric`: if true the heading is relative to the field rather
    ///   than the chassis
    ///
    /// Returns false if the request was rejected.
    fn set_drive_values(
        &self,
        speed: f64,
        heading_deg: f64,
        rotation: f64,
        field_centric: bool
    ) -> bool;

    /// Latest pose estimate.
    fn get_position(&self) -> Pose2D;
}

/// The elevator mechanism.
pub trait Elevator: Send + Sync {
    /// Set the position the elevator should move to.
    fn set_position(&self, position: f64);

    /// Current elevator position.
    fn position(&self) -> f64;

    /// True when the elevator has reached its set position.
    fn at_target(&self) -> bool;

    /// Drive the elevator open-loop with the given demand. Zero hands control
    /// back to position control.
    fn set_override(&self, demand: f64);
}

/// The intake mechanism.
pub trait Intake: Send + Sync {
    /// Set the left and right intake motor speeds.
    fn set_intake_motors(&self, left: f64, right: f64);
}
