//! Dead-reckoning odometry
//!
//! Module displacements are measured in the chassis frame. Their mean is
//! rotated into the field frame by the chassis yaw and added to the pose.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;

use util::maths::{from_polar_deg, norm_deg, to_polar_deg};

use super::NUM_MODULES;
use crate::loc::Pose2D;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Odometry {
    pose: Pose2D
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Odometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pose(&self) -> Pose2D {
        self.pose
    }

    /// Set the pose back to the origin.
    pub fn zero(&mut self) {
        self.pose = Pose2D::default();
    }

    /// Integrate one set of module displacements.
    pub fn update(
        &mut self,
        displacements: &[Vector2<f64>; NUM_MODULES],
        yaw_deg: f64
    ) -> Pose2D {
        let sum = displacements.iter().fold(Vector2::zeros(), |acc, d| acc + d);
        let mean = sum / NUM_MODULES as f64;

        let (distance, chassis_heading_deg) = to_polar_deg(mean.x, mean.y);
        let (dx, dy) = from_polar_deg(distance, norm_deg(chassis_heading_deg + yaw_deg));

        if dx.is_finite() && dy.is_finite() {
            self.pose.x += dx;
            self.pose.y += dy;
        }
        self.pose.heading_deg = norm_deg(yaw_deg);

        self.pose
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_straight_line() {
        let mut odom = Odometry::new();
        let d = [Vector2::new(0.0, 0.1); NUM_MODULES];

        for _ in 0..10 {
            odom.update(&d, 0.0);
        }

        assert!(odom.pose().x.abs() < EPS);
        assert!((odom.pose().y - 1.0).abs() < EPS);
    }

    #[test]
    fn test_yaw_rotates_into_field() {
        let mut odom = Odometry::new();

        // Chassis forward while facing right moves along field X
        let pose = odom.update(&[Vector2::new(0.0, 1.0); NUM_MODULES], 90.0);
        assert!((pose.x - 1.0).abs() < EPS);
        assert!(pose.y.abs() < EPS);
        assert!((pose.heading_deg - 90.0).abs() < EPS);

        // Opposing modules cancel
        let d = [
            Vector2::new(1.0, 0.0),
            Vector2::new(-1.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(-1.0, 0.0)
        ];
        let pose = odom.update(&d, -30.0);
        assert!((pose.x - 1.0).abs() < EPS);
        assert!((pose.heading_deg - 330.0).abs() < EPS);

        odom.zero();
        assert_eq!(odom.pose(), Pose2D::default());
    }
}
