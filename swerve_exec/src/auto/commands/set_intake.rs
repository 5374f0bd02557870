//! `setintake` command

use std::sync::Arc;

use log::info;
use util::script_interpreter::ArgType;

use super::{number_arg, CommandRegistry, RegistryError};
use crate::{auto::Command, eqpt::Intake};

/// Sets the intake motor speeds and finishes on its first update.
pub struct SetIntake {
    intake: Arc<dyn Intake>,
    left: f64,
    right: f64,
    finished: bool
}

impl SetIntake {
    pub fn new(intake: Arc<dyn Intake>, left: f64, right: f64) -> Self {
        Self {
            intake,
            left,
            right,
            finished: false
        }
    }
}

impl Command for SetIntake {
    fn name(&self) -> &str {
        "setintake"
    }

    fn start(&mut self, _time_s: f64) {
        info!("Setting intake to ({:.2}, {:.2})", self.left, self.right);
        self.intake.set_intake_motors(self.left, self.right);
    }

    fn update(&mut self, _time_s: f64) {
        self.finished = true;
    }

    fn finished(&self) -> bool {
        self.finished
    }

    fn stop(&mut self) {}
}

pub(super) fn register(reg: &mut CommandRegistry) -> Result<(), RegistryError> {
    reg.register("setintake", &[ArgType::Number, ArgType::Number], |ctx, args| {
        Ok(Box::new(SetIntake::new(
            ctx.intake.clone(),
            number_arg("setintake", args, 0)?,
            number_arg("setintake", args, 1)?
        )))
    })
}
