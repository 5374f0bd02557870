//! Shared infrastructure for the swerve drive executables: sessions,
//! logging, parameter files, maths helpers, clocks and the autonomous script
//! parser.

pub mod host;
pub mod logger;
pub mod maths;
pub mod module;
pub mod params;
pub mod script_interpreter;
pub mod session;
pub mod time;
