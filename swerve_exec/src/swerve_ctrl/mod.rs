//! # Swerve control module
//!
//! Converts robot-level motion requests into demands for the four swerve
//! modules, runs the closed-loop steering of each module, and fuses the module
//! displacements with the orientation sensor into the chassis pose.
//!
//! Frames and conventions: the chassis X axis points right and Y forward.
//! Headings are compass style, degrees clockwise from +Y, and a positive
//! rotation rate turns the chassis clockwise.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod calc_kinematics;
mod cmd;
mod heading_sensor;
mod module_ctrl;
mod module_id;
mod odometry;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use calc_kinematics::*;
pub use cmd::*;
pub use heading_sensor::*;
pub use module_ctrl::*;
pub use module_id::*;
pub use odometry::*;
pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The number of swerve modules on the chassis.
pub const NUM_MODULES: usize = 4;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur in SwerveCtrl.
#[derive(Debug, thiserror::Error)]
pub enum SwerveCtrlError {
    #[error("Invalid chassis geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid steer encoder parameters: {0}")]
    InvalidEncoderParams(String),

    #[error("Invalid control period {0} s, must be positive")]
    InvalidPeriod(f64),
}
