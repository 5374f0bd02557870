//! # Swerve control state
//!
//! `SwerveCtrl` owns the modules and the orientation sensor and is ticked by
//! the executive. Commands reach it through a `SwerveHandle`, which stores the
//! latest drive demand and reads back the published pose.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use serde::Serialize;

use util::{
    maths::{clamp, norm_deg},
    module::State
};

use super::*;
use crate::{
    eqpt::{Drivetrain, ModuleEqpt, OrientationSensor},
    loc::{Pose2D, PoseHandle},
    pid::PidGains,
    tick::Periodic
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Module speeds below this hold the previous heading.
const HOLD_HEADING_SPEED: f64 = 1e-6;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Swerve control module state
pub struct SwerveCtrl {
    params: SwerveCtrlParams,

    geometry: ChassisGeometry,

    modules: Vec<SwerveModule>,

    imu: Box<dyn OrientationSensor>,

    odometry: Odometry,

    demand: Arc<Mutex<DriveDemand>>,

    pose: PoseHandle,

    /// Last valid yaw read from the orientation sensor
    yaw_deg: f64,

    /// Yaw taken as field forward in field-centric driving
    yaw_offset_deg: f64,

    /// True once the orientation sensor has been zeroed after calibration
    yaw_zeroed: bool,

    /// True while the orientation sensor is returning nothing
    imu_lost: bool,

    /// Headings last sent to each module
    module_headings_deg: [f64; NUM_MODULES],

    report: StatusReport
}

/// Handle used by commands to drive the chassis.
#[derive(Clone)]
pub struct SwerveHandle {
    demand: Arc<Mutex<DriveDemand>>,
    pose: PoseHandle
}

/// Status report for SwerveCtrl processing.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    /// The motion used this tick, after field-centric correction.
    pub motion: RobotMotionVector,

    /// Demands sent to each module
    pub module_demands: [ModuleDemand; NUM_MODULES],

    /// Measured module states
    pub module_states: [ModuleState; NUM_MODULES],

    /// Modules which reversed their drive
    pub reversed: [bool; NUM_MODULES],

    pub emergency_tank: bool,

    /// False while the orientation sensor is unavailable
    pub imu_available: bool,

    pub pose: Pose2D
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SwerveCtrl {
    /// Create a new controller from the parameters, module equipment in
    /// module order, and the orientation sensor.
    pub fn new(
        params: SwerveCtrlParams,
        eqpt: [ModuleEqpt; NUM_MODULES],
        imu: Box<dyn OrientationSensor>
    ) -> Result<(Self, SwerveHandle), SwerveCtrlError> {
        params.validate()?;

        let [fl, fr, br, bl] = eqpt;
        let modules = vec![fl, fr, br, bl]
            .into_iter()
            .zip(ModuleId::ALL.iter())
            .map(|(e, id)| SwerveModule::new(
                *id,
                e,
                params.steer_encoder,
                params.steer_offsets_deg[id.index()],
                params.steer_gains
            ))
            .collect();

        let demand = Arc::new(Mutex::new(DriveDemand::default()));
        let pose = PoseHandle::default();

        let ctrl = Self {
            geometry: ChassisGeometry::from_params(&params),
            params,
            modules,
            imu,
            odometry: Odometry::new(),
            demand: demand.clone(),
            pose: pose.clone(),
            yaw_deg: 0.0,
            yaw_offset_deg: 0.0,
            yaw_zeroed: false,
            imu_lost: false,
            module_headings_deg: [0.0; NUM_MODULES],
            report: StatusReport::default()
        };

        Ok((ctrl, SwerveHandle { demand, pose }))
    }

    /// Get a new handle to this controller.
    pub fn handle(&self) -> SwerveHandle {
        SwerveHandle {
            demand: self.demand.clone(),
            pose: self.pose.clone()
        }
    }

    pub fn params(&self) -> &SwerveCtrlParams {
        &self.params
    }

    pub fn geometry(&self) -> &ChassisGeometry {
        &self.geometry
    }

    /// Report from the last tick.
    pub fn report(&self) -> &StatusReport {
        &self.report
    }

    /// Run one control tick.
    pub fn proc(&mut self) -> Result<StatusReport, SwerveCtrlError> {
        self.update_yaw();

        // Odometry from the module travel since the last tick
        let mut displacements = [nalgebra::Vector2::zeros(); NUM_MODULES];
        for (d, m) in displacements.iter_mut().zip(self.modules.iter_mut()) {
            *d = m.take_displacement();
        }
        let pose = self.odometry.update(&displacements, self.yaw_deg);
        self.pose.publish(pose);

        let demand = *self.demand.lock().unwrap_or_else(|e| e.into_inner());

        let mut motion = demand.motion;
        if demand.field_centric {
            motion.heading_deg -= self.yaw_deg - self.yaw_offset_deg;
        }
        motion.heading_deg = norm_deg(motion.heading_deg);

        let module_demands = if demand.emergency_tank {
            Self::calc_tank_demands(&motion)
        }
        else {
            self.calc_drive_demands(&motion)
        };

        let mut report = StatusReport {
            motion,
            module_demands,
            emergency_tank: demand.emergency_tank,
            imu_available: !self.imu_lost,
            pose,
            ..Default::default()
        };

        for (i, module) in self.modules.iter_mut().enumerate() {
            let (state, module_report) = module.proc(&module_demands[i])?;
            report.module_states[i] = state;
            report.reversed[i] = module_report.reversed;
        }

        self.report = report;

        Ok(report)
    }

    /// Put the pose back at the origin.
    pub fn zero_odometry(&mut self) {
        self.odometry.zero();
        self.pose.publish(self.odometry.pose());
        info!("Odometry zeroed");
    }

    /// Take the current yaw as field forward.
    pub fn zero_yaw(&mut self) {
        self.imu.zero_yaw();
        self.yaw_deg = 0.0;
        self.yaw_offset_deg = 0.0;
        info!("Yaw zeroed");
    }

    /// Set the steering gains of every module.
    pub fn set_steer_gains(&mut self, gains: PidGains) {
        for m in self.modules.iter_mut() {
            m.set_steer_gains(gains);
        }
        self.params.steer_gains = gains;
    }

    /// Calibrate every module's heading sensor at its current steer position.
    ///
    /// The returned offsets should be persisted as `steer_offsets_deg`.
    pub fn calibrate_modules(&mut self) -> [f64; NUM_MODULES] {
        let mut offsets = [0.0; NUM_MODULES];

        for (o, m) in offsets.iter_mut().zip(self.modules.iter_mut()) {
            *o = m.calibrate();
        }

        self.module_headings_deg = [0.0; NUM_MODULES];
        self.params.steer_offsets_deg = offsets;

        offsets
    }

    /// Trim a single module's steer offset.
    pub fn trim_module(&mut self, id: ModuleId, trim_deg: f64) {
        self.modules[id.index()].trim_center(trim_deg);
    }

    /// Read the orientation sensor, keeping the last yaw if it is unavailable.
    fn update_yaw(&mut self) {
        if !self.yaw_zeroed && !self.imu.is_calibrating() {
            self.zero_yaw();
            self.yaw_zeroed = true;
        }

        match self.imu.yaw_deg().filter(|y| y.is_finite()) {
            Some(yaw) => {
                if self.imu_lost {
                    info!("Orientation sensor available again");
                    self.imu_lost = false;
                }
                self.yaw_deg = norm_deg(yaw);
            },
            None => {
                if !self.imu_lost {
                    warn!(
                        "Orientation sensor unavailable, holding yaw at {:.2} deg",
                        self.yaw_deg
                    );
                    self.imu_lost = true;
                }
            }
        }
    }

    fn calc_drive_demands(&mut self, motion: &RobotMotionVector) -> [ModuleDemand; NUM_MODULES] {
        let vectors = self.geometry.calc_module_vectors(motion);
        let mut demands = [ModuleDemand::default(); NUM_MODULES];

        for (i, mut vector) in vectors.iter().copied().enumerate() {
            if vector.speed.abs() < HOLD_HEADING_SPEED {
                vector.heading_deg = self.module_headings_deg[i];
            }
            else {
                self.module_headings_deg[i] = vector.heading_deg;
            }

            demands[i] = ModuleDemand::Drive(vector);
        }

        demands
    }

    /// Left side drives at speed plus rotation, right side at speed minus
    /// rotation, with the steering held straight.
    fn calc_tank_demands(motion: &RobotMotionVector) -> [ModuleDemand; NUM_MODULES] {
        let mut demands = [ModuleDemand::default(); NUM_MODULES];

        for id in ModuleId::ALL.iter() {
            let speed = if id.is_left() {
                motion.speed + motion.rotation
            }
            else {
                motion.speed - motion.rotation
            };

            demands[id.index()] = ModuleDemand::Override {
                steer: 0.0,
                speed: clamp(speed, -1.0, 1.0)
            };
        }

        demands
    }
}

impl Periodic for SwerveCtrl {
    fn name(&self) -> &str {
        "swerve_ctrl"
    }

    fn tick(&mut self, _time_s: f64) {
        match self.proc() {
            Ok(r) => debug!(
                "SwerveCtrl: pose ({:.3}, {:.3}, {:.1} deg)",
                r.pose.x, r.pose.y, r.pose.heading_deg
            ),
            Err(e) => warn!("SwerveCtrl processing error: {}", e)
        }
    }

    fn stop(&mut self) {
        for m in self.modules.iter_mut() {
            m.stop();
        }
    }
}

impl SwerveHandle {
    /// Switch emergency tank driving on or off.
    pub fn set_emergency_tank(&self, enabled: bool) {
        let mut d = self.demand.lock().unwrap_or_else(|e| e.into_inner());
        if d.emergency_tank != enabled {
            warn!("Emergency tank driving {}", if enabled { "enabled" } else { "disabled" });
        }
        d.emergency_tank = enabled;
    }

    /// The latest drive demand.
    pub fn demand(&self) -> DriveDemand {
        *self.demand.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drivetrain for SwerveHandle {
    fn set_drive_values(
        &self,
        speed: f64,
        heading_deg: f64,
        rotation: f64,
        field_centric: bool
    ) -> bool {
        let motion = RobotMotionVector::new(speed, heading_deg, rotation);

        if !motion.is_finite() {
            warn!("Rejected non-finite drive values {:?}", motion);
            return false;
        }

        let mut d = self.demand.lock().unwrap_or_else(|e| e.into_inner());
        d.motion = motion;
        d.field_centric = field_centric;

        true
    }

    fn get_position(&self) -> Pose2D {
        self.pose.get()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::loopback::{LoopbackChassis, LoopbackParams};

    fn params() -> SwerveCtrlParams {
        SwerveCtrlParams {
            length: 2.0,
            width: 2.0,
            centre_of_rotation: [0.0, 0.0],
            period_s: 0.02,
            steer_gains: PidGains::new(0.02, 0.0, 0.0),
            steer_encoder: HeadingSensorParams::default(),
            steer_offsets_deg: [0.0; NUM_MODULES]
        }
    }

    fn chassis() -> (SwerveCtrl, SwerveHandle, LoopbackChassis) {
        let lb = LoopbackChassis::new(LoopbackParams::default(), &HeadingSensorParams::default());
        let (ctrl, handle) = SwerveCtrl::new(params(), lb.module_eqpt(), lb.orientation_sensor())
            .unwrap();
        (ctrl, handle, lb)
    }

    #[test]
    fn test_rejects_non_finite() {
        let (_, handle, _) = chassis();

        assert!(handle.set_drive_values(0.5, 10.0, 0.0, false));
        assert!(!handle.set_drive_values(f64::NAN, 10.0, 0.0, false));
        assert!(!handle.set_drive_values(0.5, f64::INFINITY, 0.0, true));

        // Rejected requests leave the previous demand in place
        assert_eq!(handle.demand().motion.speed, 0.5);
    }

    #[test]
    fn test_invalid_params() {
        let lb = LoopbackChassis::new(LoopbackParams::default(), &HeadingSensorParams::default());
        let mut p = params();
        p.width = 0.0;

        assert!(matches!(
            SwerveCtrl::new(p, lb.module_eqpt(), lb.orientation_sensor()),
            Err(SwerveCtrlError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_drive_forward() {
        let (mut ctrl, handle, _lb) = chassis();

        handle.set_drive_values(0.5, 0.0, 0.0, false);
        for _ in 0..50 {
            ctrl.proc().unwrap();
        }

        let pose = handle.get_position();
        assert!(pose.y > 0.0);
        assert!(pose.x.abs() < 1e-6);
    }

    #[test]
    fn test_field_centric() {
        let (mut ctrl, handle, lb) = chassis();

        // Let the sensor zero, then turn the chassis to face right
        ctrl.proc().unwrap();
        lb.set_yaw(90.0);

        handle.set_drive_values(0.5, 90.0, 0.0, true);
        let r = ctrl.proc().unwrap();
        assert!(r.motion.heading_deg.abs() < 1e-9);

        handle.set_drive_values(0.5, 90.0, 0.0, false);
        let r = ctrl.proc().unwrap();
        assert!((r.motion.heading_deg - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_robot_centric_heading_normalised() {
        let (mut ctrl, handle, _) = chassis();

        handle.set_drive_values(0.5, -90.0, 0.0, false);
        let r = ctrl.proc().unwrap();
        assert!((r.motion.heading_deg - 270.0).abs() < 1e-9);

        handle.set_drive_values(0.5, 450.0, 0.0, false);
        let r = ctrl.proc().unwrap();
        assert!((r.motion.heading_deg - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_imu_dropout_holds_yaw() {
        let (mut ctrl, _, lb) = chassis();

        ctrl.proc().unwrap();
        lb.set_yaw(45.0);
        ctrl.proc().unwrap();

        lb.set_imu_available(false);
        lb.set_yaw(80.0);
        let r = ctrl.proc().unwrap();
        assert!(!r.imu_available);
        assert!((r.pose.heading_deg - 45.0).abs() < 1e-9);

        lb.set_imu_available(true);
        let r = ctrl.proc().unwrap();
        assert!(r.imu_available);
        assert!((r.pose.heading_deg - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_emergency_tank() {
        let (mut ctrl, handle, _) = chassis();

        handle.set_emergency_tank(true);
        handle.set_drive_values(0.5, 0.0, 0.8, false);
        let r = ctrl.proc().unwrap();

        assert_eq!(
            r.module_demands[ModuleId::FrontLeft.index()],
            ModuleDemand::Override { steer: 0.0, speed: 1.0 }
        );
        match r.module_demands[ModuleId::BackRight.index()] {
            ModuleDemand::Override { steer, speed } => {
                assert_eq!(steer, 0.0);
                assert!((speed + 0.3).abs() < 1e-9);
            },
            d => panic!("Expected override, got {:?}", d)
        }
    }

    #[test]
    fn test_zero_speed_holds_heading() {
        let (mut ctrl, handle, _) = chassis();

        handle.set_drive_values(0.5, 40.0, 0.0, false);
        ctrl.proc().unwrap();

        handle.set_drive_values(0.0, 0.0, 0.0, false);
        let r = ctrl.proc().unwrap();

        for d in r.module_demands.iter() {
            match d {
                ModuleDemand::Drive(v) => {
                    assert_eq!(v.speed, 0.0);
                    assert!((v.heading_deg - 40.0).abs() < 1e-9);
                },
                d => panic!("Expected drive, got {:?}", d)
            }
        }
    }

    #[test]
    fn test_zero_odometry() {
        let (mut ctrl, handle, _) = chassis();

        handle.set_drive_values(0.5, 0.0, 0.0, false);
        for _ in 0..10 {
            ctrl.proc().unwrap();
        }
        assert!(handle.get_position().y > 0.0);

        ctrl.zero_odometry();
        assert_eq!(handle.get_position(), Pose2D::default());

        // Integration carries on from the origin
        let before = ctrl.report().pose;
        let r = ctrl.proc().unwrap();
        assert!(r.pose.y > 0.0);
        assert!(r.pose.y < before.y);
    }

    #[test]
    fn test_trim_and_steer_gains() {
        let (mut ctrl, _, _) = chassis();
        let fl = ModuleId::FrontLeft.index();
        let fr = ModuleId::FrontRight.index();

        // Trimming shifts the measured heading, which the steering then
        // corrects
        ctrl.trim_module(ModuleId::FrontRight, 10.0);
        let r = ctrl.proc().unwrap();
        assert!((r.module_states[fr].heading_deg - 350.0).abs() < 1e-6);
        assert!((r.module_states[fr].steer_output - 0.2).abs() < 1e-6);
        assert!(r.module_states[fl].heading_deg.abs() < 1e-6);
        assert_eq!(r.module_states[fl].steer_output, 0.0);

        let gains = PidGains::new(0.05, 0.0, 0.0);
        ctrl.set_steer_gains(gains);
        assert_eq!(ctrl.params().steer_gains, gains);

        // Steered 4 degrees last tick, 6 degrees of error remain
        let r = ctrl.proc().unwrap();
        assert!((r.module_states[fr].heading_deg - 354.0).abs() < 1e-6);
        assert!((r.module_states[fr].steer_output - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_calibrate_and_stop() {
        let (mut ctrl, _, _) = chassis();

        let offsets = ctrl.calibrate_modules();
        assert_eq!(offsets, ctrl.params().steer_offsets_deg);

        // Stop is idempotent
        ctrl.stop();
        ctrl.stop();
    }
}
