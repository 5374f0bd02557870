//! `wait` command

use log::{debug, info};
use util::script_interpreter::ArgType;

use super::{number_arg, CommandRegistry, RegistryError, ScriptResolutionError};
use crate::auto::Command;

/// Blocks the script for a duration.
#[derive(Debug)]
pub struct Wait {
    duration_s: f64,
    start_time_s: Option<f64>,
    finished: bool
}

impl Wait {
    pub fn new(duration_s: f64) -> Result<Self, ScriptResolutionError> {
        if !(duration_s.is_finite() && duration_s >= 0.0) {
            return Err(ScriptResolutionError::InvalidArgument(
                "wait".into(),
                format!("duration must be non-negative, found {}", duration_s)
            ));
        }

        Ok(Self {
            duration_s,
            start_time_s: None,
            finished: false
        })
    }
}

impl Command for Wait {
    fn name(&self) -> &str {
        "wait"
    }

    fn start(&mut self, time_s: f64) {
        info!("Waiting for {} s", self.duration_s);
        self.start_time_s = Some(time_s);
    }

    fn update(&mut self, time_s: f64) {
        if let Some(start) = self.start_time_s {
            if !self.finished && time_s - start > self.duration_s {
                debug!("Wait complete after {:.3} s", time_s - start);
                self.finished = true;
            }
        }
    }

    fn finished(&self) -> bool {
        self.finished
    }

    fn stop(&mut self) {}
}

pub(super) fn register(reg: &mut CommandRegistry) -> Result<(), RegistryError> {
    reg.register("wait", &[ArgType::Number], |_, args| {
        Ok(Box::new(Wait::new(number_arg("wait", args, 0)?)?))
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_wait() {
        let mut w = Wait::new(0.5).unwrap();

        // Not started, never finishes
        w.update(10.0);
        assert!(!w.finished());

        w.start(1.0);
        w.update(1.2);
        assert!(!w.finished());
        w.update(1.5);
        assert!(!w.finished());
        w.update(1.6);
        assert!(w.finished());
        assert!(!w.parallel());

        assert!(Wait::new(-0.1).is_err());
        assert!(Wait::new(f64::NAN).is_err());
    }
}
