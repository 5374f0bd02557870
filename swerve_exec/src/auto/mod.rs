//! # Autonomy module
//!
//! Runs an autonomous routine: a script of command lines is read one line at
//! a time, each line is resolved against the command registry, and the
//! resulting commands are ticked by the scheduler until the script is
//! exhausted and no command is left running.
//!
//! Commands which are not `parallel` block the script: no further line is
//! read while one of them is active.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod command;
pub mod commands;
mod params;
mod registry;
mod scheduler;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use command::{Command, NoOp};
pub use params::*;
pub use registry::*;
pub use scheduler::*;
