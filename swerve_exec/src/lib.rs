//! # Swerve library.
//!
//! This library allows the executable, benchmarks and integration tests to
//! access the swerve drive and autonomy software.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

/// Autonomy - command registry, commands and the script scheduler
pub mod auto;

/// Equipment interfaces - traits for the actuators, sensors and subsystems
pub mod eqpt;

/// Localisation - the chassis pose and its shared handle
pub mod loc;

/// Loopback equipment for dry runs
pub mod loopback;

/// PID controller
pub mod pid;

/// Swerve control - kinematics, module steering and odometry
pub mod swerve_ctrl;

/// Periodic task runner
pub mod tick;
