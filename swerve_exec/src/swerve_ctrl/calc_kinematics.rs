//! Swerve kinematics
//!
//! Each module's vector is the sum of the robot translation vector and a
//! rotation vector perpendicular to the module's radius from the centre of
//! rotation, scaled by the rotation rate and the length of that radius.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;

use util::maths::{from_polar_deg, to_polar_deg};

use super::{ModuleId, ModuleVector, RobotMotionVector, SwerveCtrlParams, NUM_MODULES};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Module positions relative to the centre of rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChassisGeometry {
    positions: [Vector2<f64>; NUM_MODULES]
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ChassisGeometry {
    pub fn new(length: f64, width: f64, centre_of_rotation: [f64; 2]) -> Self {
        let cor = Vector2::new(centre_of_rotation[0], centre_of_rotation[1]);
        let mut positions = [Vector2::zeros(); NUM_MODULES];

        for id in ModuleId::ALL.iter() {
            positions[id.index()] = id.position(length, width) - cor;
        }

        Self { positions }
    }

    pub fn from_params(params: &SwerveCtrlParams) -> Self {
        Self::new(params.length, params.width, params.centre_of_rotation)
    }

    /// Position of the given module relative to the centre of rotation.
    pub fn position(&self, id: ModuleId) -> Vector2<f64> {
        self.positions[id.index()]
    }

    /// Calculate the speed and heading of each module for the given motion.
    ///
    /// If any module speed exceeds 1 all speeds are scaled down by the largest,
    /// preserving their ratios.
    pub fn calc_module_vectors(
        &self,
        motion: &RobotMotionVector
    ) -> [ModuleVector; NUM_MODULES] {
        let (tx, ty) = from_polar_deg(motion.speed, motion.heading_deg);
        let translation = Vector2::new(tx, ty);

        let mut vectors = [ModuleVector::default(); NUM_MODULES];
        let mut max_speed = 0.0f64;

        for (vector, pos) in vectors.iter_mut().zip(self.positions.iter()) {
            // The radius turned a quarter clockwise, so a positive rotation
            // turns the chassis clockwise.
            let rotation = Vector2::new(pos.y, -pos.x) * motion.rotation;
            let v = translation + rotation;

            let (speed, heading_deg) = to_polar_deg(v.x, v.y);
            *vector = ModuleVector { speed, heading_deg };

            max_speed = max_speed.max(speed);
        }

        if max_speed > 1.0 {
            for vector in vectors.iter_mut() {
                vector.speed /= max_speed;
            }
        }

        vectors
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
