//! # Localisation module
//!
//! Provides the chassis pose and the handle through which the pose estimate is
//! published by the chassis controller and read by everyone else.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use util::maths::norm_deg;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The 2D pose of the chassis in the field frame.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose2D {
    /// Position along the field X (right) axis
    pub x: f64,

    /// Position along the field Y (forward) axis
    pub y: f64,

    /// Heading in degrees, in `[0, 360)`
    pub heading_deg: f64
}

/// Shared, single-writer handle to the latest pose.
///
/// The pose is swapped as a whole value under a lock, so readers always see a
/// complete snapshot.
#[derive(Debug, Clone, Default)]
pub struct PoseHandle {
    pose: Arc<Mutex<Pose2D>>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose2D {
    pub fn new(x: f64, y: f64, heading_deg: f64) -> Self {
        Self {
            x,
            y,
            heading_deg: norm_deg(heading_deg)
        }
    }

    /// Euclidian distance to the given point.
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        ((x - self.x).powi(2) + (y - self.y).powi(2)).sqrt()
    }
}

impl PoseHandle {
    pub fn new(pose: Pose2D) -> Self {
        Self {
            pose: Arc::new(Mutex::new(pose))
        }
    }

    /// Get a copy of the latest pose.
    pub fn get(&self) -> Pose2D {
        *self.pose.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Publish a new pose.
    pub(crate) fn publish(&self, pose: Pose2D) {
        *self.pose.lock().unwrap_or_else(|e| e.into_inner()) = pose;
    }
}
