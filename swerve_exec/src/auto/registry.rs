//! # Command registry
//!
//! Maps lowercase command names to the factories which build them. Each name
//! may have several factories, one per argument signature, and a script line
//! resolves to the factory whose signature matches its arguments exactly.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{collections::HashMap, fmt, sync::Arc};

use log::debug;
use thiserror::Error;

use util::script_interpreter::{ArgType, ScriptArg, ScriptLine};

use super::{commands, AutoParams, Command};
use crate::eqpt::{Drivetrain, Elevator, Intake};

// ---------------------------------------------------------------------------
// TYPES
// ---------------------------------------------------------------------------

/// Function building a command from the arguments of a script line.
///
/// The arguments are guaranteed to match the signature the factory was
/// registered with.
pub type CommandFactory = Box<
    dyn Fn(&CommandCtx, &[ScriptArg]) -> Result<Box<dyn Command>, ScriptResolutionError>
        + Send
        + Sync
>;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The subsystems and parameters given to every command on construction.
#[derive(Clone)]
pub struct CommandCtx {
    pub drivetrain: Arc<dyn Drivetrain>,
    pub elevator: Arc<dyn Elevator>,
    pub intake: Arc<dyn Intake>,
    pub params: AutoParams
}

#[derive(Default)]
pub struct CommandRegistry {
    factories: HashMap<String, Vec<(Vec<ArgType>, CommandFactory)>>
}

/// Wrapper for displaying a signature as `(number, bool)`.
struct Signature<'a>(&'a [ArgType]);

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum ScriptResolutionError {
    #[error("Line {0}: no command named \"{1}\"")]
    UnknownCommand(usize, String),

    #[error("Line {line_num}: \"{name}\" has no form taking {signature}, expected one of: {expected}")]
    NoMatchingSignature {
        line_num: usize,
        name: String,
        signature: String,
        expected: String
    },

    #[error("Invalid argument for \"{0}\": {1}")]
    InvalidArgument(String, String)
}

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("\"{0}\" is already registered with signature {1}")]
    DuplicateSignature(String, String)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CommandRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for `name` taking arguments of the given types.
    ///
    /// Names are case insensitive.
    pub fn register<F>(
        &mut self,
        name: &str,
        signature: &[ArgType],
        factory: F
    ) -> Result<(), RegistryError>
    where
        F: Fn(&CommandCtx, &[ScriptArg]) -> Result<Box<dyn Command>, ScriptResolutionError>
            + Send
            + Sync
            + 'static
    {
        let name = name.to_lowercase();
        let entry = self.factories.entry(name.clone()).or_default();

        if entry.iter().any(|(s, _)| s.as_slice() == signature) {
            return Err(RegistryError::DuplicateSignature(
                name,
                Signature(signature).to_string()
            ));
        }

        debug!("Registered \"{}\" {}", name, Signature(signature));
        entry.push((signature.to_vec(), Box::new(factory)));

        Ok(())
    }

    /// True if any form of `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_lowercase())
    }

    /// Build the command for a script line.
    pub fn resolve(
        &self,
        ctx: &CommandCtx,
        line: &ScriptLine
    ) -> Result<Box<dyn Command>, ScriptResolutionError> {
        let forms = self.factories
            .get(&line.name.to_lowercase())
            .ok_or_else(|| ScriptResolutionError::UnknownCommand(
                line.line_num,
                line.name.clone()
            ))?;

        let signature = line.signature();

        match forms.iter().find(|(s, _)| *s == signature) {
            Some((_, factory)) => factory(ctx, line.args.as_slice()),
            None => Err(ScriptResolutionError::NoMatchingSignature {
                line_num: line.line_num,
                name: line.name.clone(),
                signature: Signature(&signature).to_string(),
                expected: forms
                    .iter()
                    .map(|(s, _)| Signature(s).to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
        }
    }
}

/// Build the registry holding every command available to scripts.
pub fn default_registry() -> Result<CommandRegistry, RegistryError> {
    let mut reg = CommandRegistry::new();

    commands::register_all(&mut reg)?;

    Ok(reg)
}

impl<'a> fmt::Display for Signature<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let types: Vec<String> = self.0.iter().map(|t| t.to_string()).collect();
        write!(f, "({})", types.join(", "))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::{
        auto::NoOp,
        loc::Pose2D,
        loopback::{LoopbackElevator, LoopbackIntake, LoopbackParams}
    };
    use std::sync::Mutex;
    use util::script_interpreter::ScriptInterpreter;

    /// Drivetrain recording every request, with a settable pose.
    #[derive(Default)]
    pub(crate) struct RecordingDrivetrain {
        pub pose: Mutex<Pose2D>,
        pub requests: Mutex<Vec<(f64, f64, f64, bool)>>
    }

    impl Drivetrain for RecordingDrivetrain {
        fn set_drive_values(&self, speed: f64, heading_deg: f64, rotation: f64, fc: bool) -> bool {
            self.requests.lock().unwrap().push((speed, heading_deg, rotation, fc));
            true
        }

        fn get_position(&self) -> Pose2D {
            *self.pose.lock().unwrap()
        }
    }

    pub(crate) fn ctx_with(drivetrain: Arc<dyn Drivetrain>) -> CommandCtx {
        CommandCtx {
            drivetrain,
            elevator: Arc::new(LoopbackElevator::new(&LoopbackParams::default())),
            intake: Arc::new(LoopbackIntake::new()),
            params: AutoParams::default()
        }
    }

    fn line(s: &str) -> ScriptLine {
        ScriptInterpreter::from_script(s).next_line().unwrap().unwrap()
    }

    #[test]
    fn test_duplicate_signature() {
        let mut reg = CommandRegistry::new();
        let f = |_: &CommandCtx, _: &[ScriptArg]| -> Result<Box<dyn Command>, ScriptResolutionError> {
            Ok(Box::new(NoOp::new()))
        };

        reg.register("Thing", &[ArgType::Number], f).unwrap();
        reg.register("thing", &[ArgType::Bool], f).unwrap();
        assert_eq!(
            reg.register("THING", &[ArgType::Number], f),
            Err(RegistryError::DuplicateSignature("thing".into(), "(number)".into()))
        );
        assert!(reg.contains("tHiNg"));
    }

    #[test]
    fn test_resolve_navigate_forms() {
        let reg = default_registry().unwrap();
        let ctx = ctx_with(Arc::new(RecordingDrivetrain::default()));

        let cmd = reg.resolve(&ctx, &line("Navigate:1.0,2.0,90.0")).unwrap();
        assert_eq!(cmd.name(), "navigate");

        let cmd = reg.resolve(&ctx, &line("Navigate:1.0,2.0,90.0,0.5")).unwrap();
        assert_eq!(cmd.name(), "navigate");

        let cmd = reg.resolve(&ctx, &line("navigate:1,2,90,0.5,1,true,parallel")).unwrap();
        assert!(cmd.parallel());

        assert!(matches!(
            reg.resolve(&ctx, &line("Navigate:1.0,2.0")),
            Err(ScriptResolutionError::NoMatchingSignature { .. })
        ));
    }

    #[test]
    fn test_resolve_errors() {
        let reg = default_registry().unwrap();
        let ctx = ctx_with(Arc::new(RecordingDrivetrain::default()));

        assert_eq!(
            reg.resolve(&ctx, &line("fly:1")).err(),
            Some(ScriptResolutionError::UnknownCommand(1, "fly".into()))
        );

        // A bool where a number is expected
        assert!(matches!(
            reg.resolve(&ctx, &line("wait:true")),
            Err(ScriptResolutionError::NoMatchingSignature { .. })
        ));

        assert!(matches!(
            reg.resolve(&ctx, &line("wait:-1")),
            Err(ScriptResolutionError::InvalidArgument(..))
        ));
    }
}
