//! `setelevator` command

use std::sync::Arc;

use log::info;
use util::script_interpreter::ArgType;

use super::{bool_arg, number_arg, CommandRegistry, RegistryError};
use crate::{auto::Command, eqpt::Elevator};

/// Moves the elevator to a position, finishing once it is there.
pub struct SetElevator {
    elevator: Arc<dyn Elevator>,
    position: f64,
    parallel: bool,
    finished: bool
}

impl SetElevator {
    pub fn new(elevator: Arc<dyn Elevator>, position: f64, parallel: bool) -> Self {
        Self {
            elevator,
            position,
            parallel,
            finished: false
        }
    }
}

impl Command for SetElevator {
    fn name(&self) -> &str {
        "setelevator"
    }

    fn start(&mut self, _time_s: f64) {
        info!(
            "Moving elevator from {:.3} to {:.3}",
            self.elevator.position(),
            self.position
        );
        self.elevator.set_position(self.position);
    }

    fn update(&mut self, _time_s: f64) {
        if self.finished {
            return;
        }

        self.elevator.set_position(self.position);

        if self.elevator.at_target() {
            self.elevator.set_override(0.0);
            self.finished = true;
            info!("Elevator at {:.3}", self.elevator.position());
        }
    }

    fn finished(&self) -> bool {
        self.finished
    }

    fn parallel(&self) -> bool {
        self.parallel
    }

    fn stop(&mut self) {}
}

pub(super) fn register(reg: &mut CommandRegistry) -> Result<(), RegistryError> {
    reg.register("setelevator", &[ArgType::Number, ArgType::Bool], |ctx, args| {
        Ok(Box::new(SetElevator::new(
            ctx.elevator.clone(),
            number_arg("setelevator", args, 0)?,
            bool_arg("setelevator", args, 1)?
        )))
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        loopback::{LoopbackElevator, LoopbackParams},
        tick::Periodic
    };

    #[test]
    fn test_set_elevator() {
        let mut elev = LoopbackElevator::new(&LoopbackParams::default());

        let mut cmd = SetElevator::new(Arc::new(elev.clone()), 0.1, true);
        assert!(cmd.parallel());

        cmd.start(0.0);
        assert_eq!(elev.target(), 0.1);

        cmd.update(0.0);
        assert!(!cmd.finished());

        elev.tick(0.0);
        elev.tick(0.0);

        // Any manual override is released on arrival
        elev.set_override(0.3);
        cmd.update(0.1);
        assert!(cmd.finished());
        assert_eq!(elev.override_demand(), 0.0);
    }
}
