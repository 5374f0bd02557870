//! # Swerve module controller
//!
//! Each module closes a steering loop on its heading sensor and drives its
//! wheel open-loop. The shortest-path rule is applied to the steering: if the
//! demanded heading is more than a quarter turn away the module steers to the
//! opposite heading and reverses the drive instead.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::Serialize;

use util::{
    maths::{clamp, from_polar_deg, get_ang_err_deg, norm_deg, HALF_TURN_DEG},
    module::State
};

use super::{HeadingSensor, HeadingSensorParams, ModuleDemand, ModuleId, SwerveCtrlError};
use crate::{
    eqpt::{DriveEncoder, ModuleEqpt, MotorOutput},
    pid::{PidController, PidGains}
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Steering errors above this are taken by reversing the drive.
pub const REVERSE_THRESHOLD_DEG: f64 = 90.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single swerve module.
pub struct SwerveModule {
    id: ModuleId,

    sensor: HeadingSensor,
    drive_encoder: Box<dyn DriveEncoder>,
    steer_motor: Box<dyn MotorOutput>,
    drive_motor: Box<dyn MotorOutput>,

    steer_ctrl: PidController,

    /// Drive encoder distance at the last tick
    last_distance: f64,

    /// Displacement accumulated since the last time it was taken.
    displacement: Vector2<f64>,

    /// True once the module has been stopped, cleared by the next demand.
    stopped: bool
}

/// Measured and commanded state of a module after a tick.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ModuleState {
    /// Measured module heading.
    pub heading_deg: f64,

    /// Displacement accumulated and not yet taken by odometry, `[x, y]`.
    pub displacement: [f64; 2],

    /// Heading the module is steering to. In override this is the measured
    /// heading.
    pub commanded_heading_deg: f64,

    /// Speed sent to the drive motor, after any reversal.
    pub commanded_speed: f64,

    /// Demand sent to the steer motor.
    pub steer_output: f64
}

/// Status report for a module tick.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ModuleStatusReport {
    /// The drive was reversed to take the shorter steering path.
    pub reversed: bool,

    /// The module was in override.
    pub overridden: bool,

    /// Steering error fed to the controller.
    pub steer_error_deg: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SwerveModule {
    pub fn new(
        id: ModuleId,
        eqpt: ModuleEqpt,
        encoder_params: HeadingSensorParams,
        steer_offset_deg: f64,
        steer_gains: PidGains
    ) -> Self {
        let last_distance = eqpt.drive_encoder.distance();

        Self {
            id,
            sensor: HeadingSensor::new(eqpt.steer_encoder, encoder_params, steer_offset_deg),
            drive_encoder: eqpt.drive_encoder,
            steer_motor: eqpt.steer_motor,
            drive_motor: eqpt.drive_motor,
            steer_ctrl: PidController::new(steer_gains),
            last_distance,
            displacement: Vector2::zeros(),
            stopped: false
        }
    }

    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// Current measured heading.
    pub fn heading_deg(&self) -> f64 {
        self.sensor.heading_deg()
    }

    /// Return the displacement accumulated since the last call and zero it.
    pub fn take_displacement(&mut self) -> Vector2<f64> {
        let d = self.displacement;
        self.displacement = Vector2::zeros();
        d
    }

    /// Calibrate the heading sensor, returning the new offset.
    pub fn calibrate(&mut self) -> f64 {
        self.steer_ctrl.reset();
        self.sensor.calibrate()
    }

    pub fn trim_center(&mut self, trim_deg: f64) {
        self.sensor.trim_center(trim_deg)
    }

    pub fn set_steer_gains(&mut self, gains: PidGains) {
        self.steer_ctrl.set_gains(gains);
    }

    /// Zero both motors. Calling this repeatedly has no further effect.
    pub fn stop(&mut self) {
        if !self.stopped {
            self.steer_motor.set(0.0);
            self.drive_motor.set(0.0);
            self.steer_ctrl.reset();
            self.stopped = true;
        }
    }

    /// Integrate the wheel travel since the last tick along the current
    /// module heading.
    fn accumulate_displacement(&mut self, heading_deg: f64) {
        let distance = self.drive_encoder.distance();
        let delta = distance - self.last_distance;

        if delta.is_finite() {
            let (dx, dy) = from_polar_deg(delta, heading_deg);
            self.displacement += Vector2::new(dx, dy);
        }

        self.last_distance = distance;
    }
}

impl State for SwerveModule {
    type InputData = ModuleDemand;
    type OutputData = ModuleState;
    type StatusReport = ModuleStatusReport;
    type ProcError = SwerveCtrlError;

    fn proc(&mut self, demand: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        let mut report = ModuleStatusReport::default();

        let heading_deg = self.sensor.heading_deg();
        self.accumulate_displacement(heading_deg);

        let (steer_output, drive_output, commanded_heading_deg) = match *demand {
            ModuleDemand::Override { steer, speed } => {
                report.overridden = true;
                (steer, speed, heading_deg)
            },
            ModuleDemand::Drive(vector) => {
                let mut err = get_ang_err_deg(vector.heading_deg, heading_deg);
                let mut speed = vector.speed;

                if err > REVERSE_THRESHOLD_DEG {
                    err -= HALF_TURN_DEG;
                    speed = -speed;
                    report.reversed = true;
                }
                else if err < -REVERSE_THRESHOLD_DEG {
                    err += HALF_TURN_DEG;
                    speed = -speed;
                    report.reversed = true;
                }

                report.steer_error_deg = err;

                (self.steer_ctrl.update(err), speed, norm_deg(vector.heading_deg))
            }
        };

        let steer_output = clamp(steer_output, -1.0, 1.0);
        let drive_output = clamp(drive_output, -1.0, 1.0);

        self.steer_motor.set(steer_output);
        self.drive_motor.set(drive_output);
        self.stopped = false;

        Ok((
            ModuleState {
                heading_deg,
                displacement: [self.displacement.x, self.displacement.y],
                commanded_heading_deg,
                commanded_speed: drive_output,
                steer_output
            },
            report
        ))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        eqpt::SteerEncoder,
        swerve_ctrl::ModuleVector
    };
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Rig {
        voltage: f64,
        distance: f64,
        steer: f64,
        drive: f64
    }

    struct Enc(Arc<Mutex<Rig>>);
    struct Dist(Arc<Mutex<Rig>>);
    struct Steer(Arc<Mutex<Rig>>);
    struct Drive(Arc<Mutex<Rig>>);

    impl SteerEncoder for Enc {
        fn voltage(&self) -> f64 { self.0.lock().unwrap().voltage }
        fn turn_count(&self) -> i64 { 0 }
        fn reset_turn_count(&mut self) {}
    }

    impl DriveEncoder for Dist {
        fn distance(&self) -> f64 { self.0.lock().unwrap().distance }
        fn reset(&mut self) { self.0.lock().unwrap().distance = 0.0 }
    }

    impl MotorOutput for Steer {
        fn set(&mut self, d: f64) { self.0.lock().unwrap().steer = d }
    }

    impl MotorOutput for Drive {
        fn set(&mut self, d: f64) { self.0.lock().unwrap().drive = d }
    }

    fn module() -> (SwerveModule, Arc<Mutex<Rig>>) {
        let rig = Arc::new(Mutex::new(Rig::default()));
        let eqpt = ModuleEqpt {
            steer_encoder: Box::new(Enc(rig.clone())),
            drive_encoder: Box::new(Dist(rig.clone())),
            steer_motor: Box::new(Steer(rig.clone())),
            drive_motor: Box::new(Drive(rig.clone()))
        };

        let m = SwerveModule::new(
            ModuleId::FrontLeft,
            eqpt,
            HeadingSensorParams::default(),
            0.0,
            PidGains::new(0.01, 0.0, 0.0)
        );

        (m, rig)
    }

    fn drive(speed: f64, heading_deg: f64) -> ModuleDemand {
        ModuleDemand::Drive(ModuleVector { speed, heading_deg })
    }

    #[test]
    fn test_steer_direction() {
        let (mut m, rig) = module();

        let (_, report) = m.proc(&drive(0.5, 30.0)).unwrap();
        assert!(!report.reversed);
        assert!((report.steer_error_deg - 30.0).abs() < 1e-9);

        let r = rig.lock().unwrap();
        assert!((r.steer - 0.3).abs() < 1e-9);
        assert!((r.drive - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_reverse() {
        let (mut m, rig) = module();

        // 120 deg away, take the 60 deg path backwards
        let (_, report) = m.proc(&drive(0.5, 240.0)).unwrap();
        assert!(report.reversed);
        assert!((report.steer_error_deg - 60.0).abs() < 1e-9);
        assert!((rig.lock().unwrap().drive + 0.5).abs() < 1e-9);

        let (_, report) = m.proc(&drive(0.5, 100.0)).unwrap();
        assert!(report.reversed);
        assert!((report.steer_error_deg + 80.0).abs() < 1e-9);

        // Exactly a quarter turn is not reversed
        let (_, report) = m.proc(&drive(0.5, 90.0)).unwrap();
        assert!(!report.reversed);
    }

    #[test]
    fn test_override_and_stop() {
        let (mut m, rig) = module();

        let (state, report) = m.proc(&ModuleDemand::Override { steer: 2.0, speed: -0.4 }).unwrap();
        assert!(report.overridden);
        assert_eq!(state.steer_output, 1.0);
        assert!((rig.lock().unwrap().drive + 0.4).abs() < 1e-9);

        m.stop();
        assert_eq!(rig.lock().unwrap().drive, 0.0);

        // A second stop does not touch the motors
        rig.lock().unwrap().drive = 0.7;
        m.stop();
        assert_eq!(rig.lock().unwrap().drive, 0.7);
    }

    #[test]
    fn test_displacement() {
        let (mut m, rig) = module();

        rig.lock().unwrap().distance = 2.0;
        m.proc(&drive(0.0, 0.0)).unwrap();

        // Quarter of the way round the absolute range
        {
            let mut r = rig.lock().unwrap();
            r.voltage = 5.0 * 90.0 / HeadingSensorParams::default().deg_per_rotation;
            r.distance = 3.0;
        }
        let (state, _) = m.proc(&drive(0.0, 90.0)).unwrap();
        assert!((state.displacement[0] - 1.0).abs() < 1e-9);
        assert!((state.displacement[1] - 2.0).abs() < 1e-9);

        let d = m.take_displacement();
        assert!((d.x - 1.0).abs() < 1e-9);
        assert_eq!(m.take_displacement(), Vector2::zeros());
    }
}
