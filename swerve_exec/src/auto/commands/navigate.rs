//! # `navigate` command
//!
//! Drives the chassis to a goal position and heading. Outside the waypoint
//! radius the chassis cruises toward the goal at constant speed. Inside it a
//! final waypoint closes in under the speed controller until it is within
//! `FINE_ARRIVAL_THRESHOLD`, while an intermediate waypoint finishes straight
//! away so the next line of the script can take over. The heading is held by
//! the rotation controller throughout.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::Arc;

use log::{info, trace};
use util::{
    maths::{clamp, get_ang_err_deg, norm_deg, to_polar_deg},
    script_interpreter::{ArgType, ScriptArg}
};

use super::{bool_arg, number_arg, CommandRegistry, RegistryError, ScriptResolutionError};
use crate::{
    auto::{Command, CommandCtx, NavigateParams},
    eqpt::Drivetrain,
    pid::PidController
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Distance from a final waypoint at which navigation is complete.
pub const FINE_ARRIVAL_THRESHOLD: f64 = 0.2;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

pub struct Navigate {
    drivetrain: Arc<dyn Drivetrain>,

    goal_x: f64,
    goal_y: f64,
    goal_heading_deg: f64,

    /// Cruise speed outside the waypoint radius
    speed: f64,

    waypoint_radius: f64,

    final_waypoint: bool,

    parallel: bool,

    speed_ctrl: PidController,
    rotation_ctrl: PidController,

    finished: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Navigate {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        drivetrain: Arc<dyn Drivetrain>,
        params: &NavigateParams,
        goal: (f64, f64, f64),
        speed: f64,
        waypoint_radius: f64,
        final_waypoint: bool,
        parallel: bool
    ) -> Result<Self, ScriptResolutionError> {
        // Smaller radii can be stepped over and never reached
        if !(waypoint_radius.is_finite() && waypoint_radius >= FINE_ARRIVAL_THRESHOLD) {
            return Err(ScriptResolutionError::InvalidArgument(
                "navigate".into(),
                format!(
                    "waypoint radius must be at least {}, found {}",
                    FINE_ARRIVAL_THRESHOLD, waypoint_radius
                )
            ));
        }

        if !speed.is_finite() {
            return Err(ScriptResolutionError::InvalidArgument(
                "navigate".into(),
                format!("speed must be finite, found {}", speed)
            ));
        }

        Ok(Self {
            drivetrain,
            goal_x: goal.0,
            goal_y: goal.1,
            goal_heading_deg: norm_deg(goal.2),
            speed: clamp(speed, 0.0, 1.0),
            waypoint_radius,
            final_waypoint,
            parallel,
            speed_ctrl: PidController::new(params.speed_gains),
            rotation_ctrl: PidController::new(params.rotation_gains),
            finished: false
        })
    }

    /// Build from script arguments, filling in defaults for the shorter forms.
    fn from_args(ctx: &CommandCtx, args: &[ScriptArg]) -> Result<Self, ScriptResolutionError> {
        let defaults = &ctx.params.navigate;
        let num = |i| number_arg("navigate", args, i);
        let flag = |i| bool_arg("navigate", args, i);

        let goal = (num(0)?, num(1)?, num(2)?);

        let speed = if args.len() > 3 { num(3)? } else { defaults.default_speed };

        let radius = if args.len() > 4 {
            num(4)?
        }
        else {
            defaults.default_waypoint_radius
        };

        // The five argument form is an intermediate waypoint
        let final_waypoint = match args.len() {
            0..=4 => true,
            5 => false,
            _ => flag(5)?
        };

        let parallel = if args.len() > 6 { flag(6)? } else { false };

        Self::new(
            ctx.drivetrain.clone(),
            defaults,
            goal,
            speed,
            radius,
            final_waypoint,
            parallel
        )
    }

    /// Emit the stop demand and finish.
    fn finish(&mut self) {
        self.drivetrain.set_drive_values(0.0, 0.0, 0.0, false);
        self.finished = true;
        info!(
            "Navigation to ({:.2}, {:.2}, {:.1} deg) complete",
            self.goal_x, self.goal_y, self.goal_heading_deg
        );
    }
}

impl Command for Navigate {
    fn name(&self) -> &str {
        "navigate"
    }

    fn start(&mut self, _time_s: f64) {
        info!(
            "Navigating to ({:.2}, {:.2}, {:.1} deg) at speed {:.2}, radius {:.2} ({})",
            self.goal_x,
            self.goal_y,
            self.goal_heading_deg,
            self.speed,
            self.waypoint_radius,
            if self.final_waypoint { "final" } else { "pass through" }
        );
    }

    fn update(&mut self, _time_s: f64) {
        if self.finished {
            return;
        }

        let pose = self.drivetrain.get_position();
        let (distance, bearing_deg) = to_polar_deg(self.goal_x - pose.x, self.goal_y - pose.y);

        let rotation = self.rotation_ctrl.update(
            get_ang_err_deg(self.goal_heading_deg, pose.heading_deg)
        );

        let speed = if distance > self.waypoint_radius {
            self.speed
        }
        else if self.final_waypoint {
            let s = self.speed_ctrl.update(distance);

            if distance < FINE_ARRIVAL_THRESHOLD {
                self.finish();
                return;
            }

            clamp(s, 0.0, self.speed)
        }
        else {
            self.finish();
            return;
        };

        trace!(
            "Navigate: distance {:.3}, bearing {:.1}, speed {:.3}, rotation {:.3}",
            distance, bearing_deg, speed, rotation
        );

        self.drivetrain.set_drive_values(speed, bearing_deg, rotation, true);
    }

    fn finished(&self) -> bool {
        self.finished
    }

    fn parallel(&self) -> bool {
        self.parallel
    }

    fn stop(&mut self) {
        self.speed_ctrl.reset();
        self.rotation_ctrl.reset();
    }
}

pub(super) fn register(reg: &mut CommandRegistry) -> Result<(), RegistryError> {
    use ArgType::{Bool as B, Number as N};

    let forms: [&[ArgType]; 5] = [
        &[N, N, N],
        &[N, N, N, N],
        &[N, N, N, N, N],
        &[N, N, N, N, N, B],
        &[N, N, N, N, N, B, B]
    ];

    for sig in forms.iter() {
        reg.register("navigate", sig, |ctx, args| {
            Ok(Box::new(Navigate::from_args(ctx, args)?))
        })?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        auto::registry::test::{ctx_with, RecordingDrivetrain},
        loc::Pose2D,
        pid::PidGains
    };

    fn params() -> NavigateParams {
        NavigateParams {
            default_speed: 0.6,
            default_waypoint_radius: 1.0,
            speed_gains: PidGains::new(0.1, 0.0, 0.0),
            rotation_gains: PidGains::new(0.03, 0.0, 0.0)
        }
    }

    #[test]
    fn test_at_goal_finishes_first_tick() {
        let dt = Arc::new(RecordingDrivetrain::default());
        let mut nav = Navigate::new(dt.clone(), &params(), (0.0, 0.0, 0.0), 0.6, 1.0, true, false)
            .unwrap();

        nav.start(0.0);
        nav.update(0.0);

        assert!(nav.finished());
        assert_eq!(*dt.requests.lock().unwrap(), vec![(0.0, 0.0, 0.0, false)]);

        // Stop demand is not repeated
        nav.update(0.1);
        assert_eq!(dt.requests.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_pass_through() {
        let dt = Arc::new(RecordingDrivetrain::default());
        let mut nav = Navigate::new(dt.clone(), &params(), (10.0, 0.0, 0.0), 0.6, 1.0, false, false)
            .unwrap();

        nav.start(0.0);
        nav.update(0.0);
        assert!(!nav.finished());
        {
            let r = dt.requests.lock().unwrap();
            let (speed, bearing, _, fc) = r[0];
            assert_eq!(speed, 0.6);
            assert!((bearing - 90.0).abs() < 1e-9);
            assert!(fc);
        }

        // Just outside the radius: still cruising
        *dt.pose.lock().unwrap() = Pose2D::new(8.9, 0.0, 0.0);
        nav.update(0.1);
        assert!(!nav.finished());
        assert_eq!(dt.requests.lock().unwrap()[1].0, 0.6);

        // On the radius: finish without holding
        *dt.pose.lock().unwrap() = Pose2D::new(9.0, 0.0, 0.0);
        nav.update(0.2);
        assert!(nav.finished());

        let r = dt.requests.lock().unwrap();
        assert_eq!(r.len(), 3);
        assert_eq!(r[2], (0.0, 0.0, 0.0, false));
    }

    #[test]
    fn test_final_approach() {
        let dt = Arc::new(RecordingDrivetrain::default());
        let mut nav = Navigate::new(dt.clone(), &params(), (0.0, 5.0, 0.0), 0.5, 1.0, true, false)
            .unwrap();

        nav.start(0.0);

        *dt.pose.lock().unwrap() = Pose2D::new(0.0, 4.5, 0.0);
        nav.update(0.0);
        assert!(!nav.finished());
        let (speed, bearing, _, _) = dt.requests.lock().unwrap()[0];
        assert!((speed - 0.05).abs() < 1e-9);
        assert!(bearing.abs() < 1e-9);

        *dt.pose.lock().unwrap() = Pose2D::new(0.0, 4.85, 0.0);
        nav.update(0.1);
        assert!(nav.finished());
    }

    #[test]
    fn test_rotation_hold() {
        let dt = Arc::new(RecordingDrivetrain::default());
        let mut nav = Navigate::new(dt.clone(), &params(), (0.0, 10.0, 10.0), 0.5, 1.0, true, false)
            .unwrap();

        *dt.pose.lock().unwrap() = Pose2D::new(0.0, 0.0, 350.0);
        nav.update(0.0);

        // 20 degrees clockwise, across the zero line
        let (_, _, rotation, _) = dt.requests.lock().unwrap()[0];
        assert!((rotation - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_defaults() {
        let ctx = ctx_with(Arc::new(RecordingDrivetrain::default()));
        let n = |a: &[ScriptArg]| Navigate::from_args(&ctx, a).unwrap();
        let num = ScriptArg::Number;

        let nav = n(&[num(1.0), num(2.0), num(3.0)]);
        assert_eq!(nav.speed, ctx.params.navigate.default_speed);
        assert_eq!(nav.waypoint_radius, ctx.params.navigate.default_waypoint_radius);
        assert!(nav.final_waypoint);

        let nav = n(&[num(1.0), num(2.0), num(3.0), num(0.4)]);
        assert_eq!(nav.speed, 0.4);
        assert!(nav.final_waypoint);

        let nav = n(&[num(1.0), num(2.0), num(3.0), num(0.4), num(0.5)]);
        assert_eq!(nav.waypoint_radius, 0.5);
        assert!(!nav.final_waypoint);

        let nav = n(&[
            num(1.0), num(2.0), num(3.0), num(0.4), num(0.5),
            ScriptArg::Bool(true), ScriptArg::Bool(true)
        ]);
        assert!(nav.final_waypoint);
        assert!(nav.parallel());

        assert!(Navigate::from_args(&ctx, &[num(1.0), num(2.0), num(3.0), num(0.4), num(-1.0)])
            .is_err());
    }

    #[test]
    fn test_radius_below_arrival_threshold() {
        let dt: Arc<dyn Drivetrain> = Arc::new(RecordingDrivetrain::default());

        for radius in [0.0, 0.1, FINE_ARRIVAL_THRESHOLD - 1e-9].iter() {
            assert!(matches!(
                Navigate::new(dt.clone(), &params(), (0.0, 1.0, 0.0), 0.6, *radius, true, false),
                Err(ScriptResolutionError::InvalidArgument(..))
            ));
        }

        assert!(
            Navigate::new(dt, &params(), (0.0, 1.0, 0.0), 0.6, FINE_ARRIVAL_THRESHOLD, true, false)
                .is_ok()
        );
    }
}
