//! # Loopback equipment
//!
//! Ideal implementations of the equipment traits for dry runs and tests. The
//! loopback modules integrate their motor demands once per call to `set`, so
//! each control tick moves the steering by `steer_rate_deg * demand` and the
//! wheel by `drive_distance * demand`. The chassis itself does not turn: the
//! yaw only changes when set from outside.
//!
//! All loopback handles are cheap to clone and share their state.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{Arc, Mutex, MutexGuard};

use log::trace;
use serde::Deserialize;

use util::maths::{clamp, lin_map, norm_deg};

use crate::{
    eqpt::*,
    swerve_ctrl::{HeadingSensorParams, ModuleId, NUM_MODULES},
    tick::Periodic
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the loopback equipment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoopbackParams {
    /// Wheel degrees turned per tick at full steer demand.
    pub steer_rate_deg: f64,

    /// Distance travelled per tick at full drive demand.
    pub drive_distance: f64,

    /// Number of orientation sensor reads for which it reports calibrating.
    pub imu_calibration_reads: u32,

    /// Elevator travel per tick.
    pub elevator_rate: f64,

    /// Distance from the set point at which the elevator is at target.
    pub elevator_tolerance: f64
}

/// State of a loopback module.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopbackModuleState {
    /// Continuous steer angle of the wheel.
    pub steer_deg: f64,

    /// Total wheel travel.
    pub distance: f64,

    /// Last steer motor demand.
    pub steer_demand: f64,

    /// Last drive motor demand.
    pub drive_demand: f64
}

/// Loopback chassis equipment: four modules and an orientation sensor.
#[derive(Clone)]
pub struct LoopbackChassis {
    params: LoopbackParams,
    encoder: HeadingSensorParams,
    modules: Vec<Arc<Mutex<ModuleSim>>>,
    imu: Arc<Mutex<ImuSim>>
}

/// Loopback elevator, moving toward its set point each tick.
#[derive(Clone)]
pub struct LoopbackElevator {
    rate: f64,
    tolerance: f64,
    state: Arc<Mutex<ElevatorSim>>
}

/// Loopback intake which records the motor speeds.
#[derive(Clone, Default)]
pub struct LoopbackIntake {
    motors: Arc<Mutex<(f64, f64)>>
}

#[derive(Debug, Default)]
struct ModuleSim {
    state: LoopbackModuleState,

    /// Absolute sensor turn at which the counter was last reset
    turn_base: i64,

    /// Distance at which the drive encoder was last reset
    distance_base: f64
}

#[derive(Debug, Default)]
struct ImuSim {
    yaw_deg: f64,
    zero_deg: f64,
    available: bool,
    calibration_reads: u32
}

#[derive(Debug, Default)]
struct ElevatorSim {
    position: f64,
    target: f64,
    override_demand: f64
}

struct SimSteerEncoder {
    sim: Arc<Mutex<ModuleSim>>,
    params: HeadingSensorParams
}

struct SimDriveEncoder(Arc<Mutex<ModuleSim>>);

struct SimSteerMotor {
    sim: Arc<Mutex<ModuleSim>>,
    rate_deg: f64
}

struct SimDriveMotor {
    sim: Arc<Mutex<ModuleSim>>,
    distance: f64
}

struct SimImu(Arc<Mutex<ImuSim>>);

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for LoopbackParams {
    fn default() -> Self {
        Self {
            steer_rate_deg: 20.0,
            drive_distance: 0.05,
            imu_calibration_reads: 0,
            elevator_rate: 0.05,
            elevator_tolerance: 0.01
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl LoopbackChassis {
    pub fn new(params: LoopbackParams, encoder: &HeadingSensorParams) -> Self {
        let imu = ImuSim {
            available: true,
            calibration_reads: params.imu_calibration_reads,
            ..Default::default()
        };

        Self {
            params,
            encoder: *encoder,
            modules: (0..NUM_MODULES)
                .map(|_| Arc::new(Mutex::new(ModuleSim::default())))
                .collect(),
            imu: Arc::new(Mutex::new(imu))
        }
    }

    /// Equipment for each module, in module order.
    pub fn module_eqpt(&self) -> [ModuleEqpt; NUM_MODULES] {
        let e = |id: ModuleId| {
            let sim = &self.modules[id.index()];

            ModuleEqpt {
                steer_encoder: Box::new(SimSteerEncoder {
                    sim: sim.clone(),
                    params: self.encoder
                }),
                drive_encoder: Box::new(SimDriveEncoder(sim.clone())),
                steer_motor: Box::new(SimSteerMotor {
                    sim: sim.clone(),
                    rate_deg: self.params.steer_rate_deg
                }),
                drive_motor: Box::new(SimDriveMotor {
                    sim: sim.clone(),
                    distance: self.params.drive_distance
                })
            }
        };

        [
            e(ModuleId::FrontLeft),
            e(ModuleId::FrontRight),
            e(ModuleId::BackRight),
            e(ModuleId::BackLeft)
        ]
    }

    pub fn orientation_sensor(&self) -> Box<dyn OrientationSensor> {
        Box::new(SimImu(self.imu.clone()))
    }

    pub fn module_state(&self, id: ModuleId) -> LoopbackModuleState {
        lock(&self.modules[id.index()]).state
    }

    /// Set the continuous steer angle of a module.
    pub fn set_steer_deg(&self, id: ModuleId, steer_deg: f64) {
        lock(&self.modules[id.index()]).state.steer_deg = steer_deg;
    }

    /// Set the true chassis yaw.
    pub fn set_yaw(&self, yaw_deg: f64) {
        lock(&self.imu).yaw_deg = yaw_deg;
    }

    /// Make the orientation sensor return readings or nothing.
    pub fn set_imu_available(&self, available: bool) {
        lock(&self.imu).available = available;
    }
}

impl SteerEncoder for SimSteerEncoder {
    fn voltage(&self) -> f64 {
        let dpr = self.params.deg_per_rotation;
        let steer_deg = lock(&self.sim).state.steer_deg;
        let within_deg = steer_deg - (steer_deg / dpr).floor() * dpr;

        lin_map(
            (0.0, dpr),
            (self.params.min_voltage, self.params.max_voltage),
            within_deg
        )
    }

    fn turn_count(&self) -> i64 {
        let sim = lock(&self.sim);
        (sim.state.steer_deg / self.params.deg_per_rotation).floor() as i64 - sim.turn_base
    }

    fn reset_turn_count(&mut self) {
        let mut sim = lock(&self.sim);
        sim.turn_base = (sim.state.steer_deg / self.params.deg_per_rotation).floor() as i64;
    }
}

impl DriveEncoder for SimDriveEncoder {
    fn distance(&self) -> f64 {
        let sim = lock(&self.0);
        sim.state.distance - sim.distance_base
    }

    fn reset(&mut self) {
        let mut sim = lock(&self.0);
        sim.distance_base = sim.state.distance;
    }
}

impl MotorOutput for SimSteerMotor {
    fn set(&mut self, demand: f64) {
        let demand = clamp(demand, -1.0, 1.0);
        let mut sim = lock(&self.sim);
        sim.state.steer_demand = demand;
        sim.state.steer_deg += demand * self.rate_deg;
    }
}

impl MotorOutput for SimDriveMotor {
    fn set(&mut self, demand: f64) {
        let demand = clamp(demand, -1.0, 1.0);
        let mut sim = lock(&self.sim);
        sim.state.drive_demand = demand;
        sim.state.distance += demand * self.distance;
    }
}

impl OrientationSensor for SimImu {
    fn yaw_deg(&mut self) -> Option<f64> {
        let mut imu = lock(&self.0);

        if imu.calibration_reads > 0 {
            imu.calibration_reads -= 1;
        }

        if imu.available {
            Some(norm_deg(imu.yaw_deg - imu.zero_deg))
        }
        else {
            None
        }
    }

    fn is_calibrating(&self) -> bool {
        lock(&self.0).calibration_reads > 0
    }

    fn zero_yaw(&mut self) {
        let mut imu = lock(&self.0);
        imu.zero_deg = imu.yaw_deg;
    }
}

impl LoopbackElevator {
    pub fn new(params: &LoopbackParams) -> Self {
        Self {
            rate: params.elevator_rate,
            tolerance: params.elevator_tolerance,
            state: Arc::new(Mutex::new(ElevatorSim::default()))
        }
    }

    pub fn target(&self) -> f64 {
        lock(&self.state).target
    }

    pub fn override_demand(&self) -> f64 {
        lock(&self.state).override_demand
    }
}

impl Elevator for LoopbackElevator {
    fn set_position(&self, position: f64) {
        lock(&self.state).target = position;
    }

    fn position(&self) -> f64 {
        lock(&self.state).position
    }

    fn at_target(&self) -> bool {
        let s = lock(&self.state);
        (s.position - s.target).abs() <= self.tolerance
    }

    fn set_override(&self, demand: f64) {
        lock(&self.state).override_demand = clamp(demand, -1.0, 1.0);
    }
}

impl Periodic for LoopbackElevator {
    fn name(&self) -> &str {
        "loopback_elevator"
    }

    fn tick(&mut self, _time_s: f64) {
        let mut s = lock(&self.state);

        if s.override_demand != 0.0 {
            s.position += s.override_demand * self.rate;
        }
        else {
            let step = clamp(s.target - s.position, -self.rate, self.rate);
            s.position += step;
        }

        trace!("Loopback elevator at {:.3} (target {:.3})", s.position, s.target);
    }

    fn stop(&mut self) {
        lock(&self.state).override_demand = 0.0;
    }
}

impl LoopbackIntake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last `(left, right)` motor speeds.
    pub fn motors(&self) -> (f64, f64) {
        *lock(&self.motors)
    }
}

impl Intake for LoopbackIntake {
    fn set_intake_motors(&self, left: f64, right: f64) {
        *lock(&self.motors) = (clamp(left, -1.0, 1.0), clamp(right, -1.0, 1.0));
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::swerve_ctrl::HeadingSensor;

    #[test]
    fn test_params_file() {
        let params: LoopbackParams = util::params::from_str(
            include_str!("../../params/loopback.toml")
        ).unwrap();

        assert_eq!(params.imu_calibration_reads, 10);

        // Missing keys take their defaults
        let params: LoopbackParams = util::params::from_str("drive_distance = 0.1").unwrap();
        assert_eq!(params.steer_rate_deg, LoopbackParams::default().steer_rate_deg);
    }

    #[test]
    fn test_steer_encoder_tracks_angle() {
        let enc_params = HeadingSensorParams::default();
        let lb = LoopbackChassis::new(LoopbackParams::default(), &enc_params);
        let [fl, ..] = lb.module_eqpt();

        let sensor = HeadingSensor::new(fl.steer_encoder, enc_params, 0.0);

        for angle in [0.0, 45.0, 200.0, 359.0, -30.0].iter() {
            lb.set_steer_deg(ModuleId::FrontLeft, *angle);
            assert!((sensor.heading_deg() - norm_deg(*angle)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_motors_integrate() {
        let lb = LoopbackChassis::new(LoopbackParams::default(), &HeadingSensorParams::default());
        let [_, mut fr, ..] = lb.module_eqpt();

        fr.drive_motor.set(0.5);
        fr.drive_motor.set(0.5);
        fr.steer_motor.set(-1.0);

        let s = lb.module_state(ModuleId::FrontRight);
        assert!((s.distance - 0.05).abs() < 1e-9);
        assert!((s.steer_deg + 20.0).abs() < 1e-9);
        assert!((fr.drive_encoder.distance() - 0.05).abs() < 1e-9);

        fr.drive_encoder.reset();
        assert_eq!(fr.drive_encoder.distance(), 0.0);
    }

    #[test]
    fn test_imu() {
        let params = LoopbackParams {
            imu_calibration_reads: 2,
            ..Default::default()
        };
        let lb = LoopbackChassis::new(params, &HeadingSensorParams::default());
        let mut imu = lb.orientation_sensor();

        assert!(imu.is_calibrating());
        imu.yaw_deg();
        imu.yaw_deg();
        assert!(!imu.is_calibrating());

        lb.set_yaw(30.0);
        imu.zero_yaw();
        lb.set_yaw(20.0);
        assert_eq!(imu.yaw_deg(), Some(350.0));

        lb.set_imu_available(false);
        assert_eq!(imu.yaw_deg(), None);
    }

    #[test]
    fn test_elevator() {
        let mut elev = LoopbackElevator::new(&LoopbackParams::default());

        elev.set_position(0.12);
        assert!(!elev.at_target());

        for _ in 0..3 {
            elev.tick(0.0);
        }
        assert!(elev.at_target());
        assert!((elev.position() - 0.12).abs() < 1e-9);

        elev.set_override(1.0);
        elev.tick(0.0);
        assert!((elev.position() - 0.17).abs() < 1e-9);

        elev.stop();
        assert_eq!(elev.override_demand(), 0.0);
    }
}
