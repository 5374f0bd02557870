//! Swerve module identifiers

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector2;
use serde::Serialize;

use super::NUM_MODULES;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The position of a module on the chassis.
///
/// Modules are numbered clockwise starting at the front left, and this order
/// is used for every per-module array in the swerve software.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ModuleId {
    FrontLeft,
    FrontRight,
    BackRight,
    BackLeft
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ModuleId {
    /// All modules, in array order.
    pub const ALL: [ModuleId; NUM_MODULES] = [
        ModuleId::FrontLeft,
        ModuleId::FrontRight,
        ModuleId::BackRight,
        ModuleId::BackLeft
    ];

    /// Index of the module in per-module arrays.
    pub fn index(self) -> usize {
        match self {
            ModuleId::FrontLeft => 0,
            ModuleId::FrontRight => 1,
            ModuleId::BackRight => 2,
            ModuleId::BackLeft => 3
        }
    }

    /// True for modules on the left side of the chassis.
    pub fn is_left(self) -> bool {
        matches!(self, ModuleId::FrontLeft | ModuleId::BackLeft)
    }

    /// Position of the module's steer axis relative to the geometric centre
    /// of the chassis.
    pub fn position(self, length: f64, width: f64) -> Vector2<f64> {
        let half_l = length / 2.0;
        let half_w = width / 2.0;

        match self {
            ModuleId::FrontLeft => Vector2::new(-half_w, half_l),
            ModuleId::FrontRight => Vector2::new(half_w, half_l),
            ModuleId::BackRight => Vector2::new(half_w, -half_l),
            ModuleId::BackLeft => Vector2::new(-half_w, -half_l)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_module_order() {
        for (i, id) in ModuleId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
        }

        assert!(ModuleId::FrontLeft.is_left());
        assert!(ModuleId::BackLeft.is_left());
        assert!(!ModuleId::FrontRight.is_left());
        assert!(!ModuleId::BackRight.is_left());

        // Clockwise from front left: each position is the previous one turned
        // a quarter clockwise on a square chassis
        let p: Vec<_> = ModuleId::ALL.iter().map(|m| m.position(2.0, 2.0)).collect();
        assert_eq!(p[0], Vector2::new(-1.0, 1.0));
        assert_eq!(p[1], Vector2::new(1.0, 1.0));
        assert_eq!(p[2], Vector2::new(1.0, -1.0));
        assert_eq!(p[3], Vector2::new(-1.0, -1.0));
    }
}
