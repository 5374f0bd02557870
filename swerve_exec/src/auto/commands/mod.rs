//! # Command implementations
//!
//! | Name          | Arguments                                              |
//! |---------------|--------------------------------------------------------|
//! | `wait`        | duration                                               |
//! | `navigate`    | x, y, heading [, speed [, radius [, final [, parallel]]]] |
//! | `setelevator` | position, parallel                                     |
//! | `setintake`   | left speed, right speed                                |

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod navigate;
mod set_elevator;
mod set_intake;
mod wait;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use util::script_interpreter::ScriptArg;

use super::{CommandRegistry, RegistryError, ScriptResolutionError};

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use navigate::{Navigate, FINE_ARRIVAL_THRESHOLD};
pub use set_elevator::SetElevator;
pub use set_intake::SetIntake;
pub use wait::Wait;

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Register every command's factories.
pub fn register_all(reg: &mut CommandRegistry) -> Result<(), RegistryError> {
    wait::register(reg)?;
    navigate::register(reg)?;
    set_elevator::register(reg)?;
    set_intake::register(reg)?;

    Ok(())
}

/// Get argument `idx` as a finite number.
fn number_arg(
    cmd: &str,
    args: &[ScriptArg],
    idx: usize
) -> Result<f64, ScriptResolutionError> {
    match args.get(idx).and_then(ScriptArg::as_number) {
        Some(n) if n.is_finite() => Ok(n),
        Some(n) => Err(ScriptResolutionError::InvalidArgument(
            cmd.into(),
            format!("argument {} ({}) is not finite", idx + 1, n)
        )),
        None => Err(ScriptResolutionError::InvalidArgument(
            cmd.into(),
            format!("argument {} is not a number", idx + 1)
        ))
    }
}

/// Get argument `idx` as a bool.
fn bool_arg(
    cmd: &str,
    args: &[ScriptArg],
    idx: usize
) -> Result<bool, ScriptResolutionError> {
    args.get(idx)
        .and_then(ScriptArg::as_bool)
        .ok_or_else(|| ScriptResolutionError::InvalidArgument(
            cmd.into(),
            format!("argument {} is not a bool", idx + 1)
        ))
}
