//! # Autonomy Parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use crate::pid::PidGains;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the autonomy system
#[derive(Debug, Deserialize, Clone)]
pub struct AutoParams {
    /// Period at which the scheduler is ticked.
    pub scheduler_period_s: f64,

    /// Period at which each active command is updated.
    pub command_period_s: f64,

    /// Parameters for the navigate command.
    pub navigate: NavigateParams
}

#[derive(Debug, Deserialize, Clone)]
pub struct NavigateParams {
    /// Cruise speed used when a navigate line does not give one.
    pub default_speed: f64,

    /// Waypoint radius used when a navigate line does not give one.
    pub default_waypoint_radius: f64,

    /// Gains of the approach speed controller, acting on the distance to the
    /// goal.
    pub speed_gains: PidGains,

    /// Gains of the rotation hold controller, acting on the heading error.
    pub rotation_gains: PidGains
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for AutoParams {
    fn default() -> Self {
        Self {
            scheduler_period_s: 0.02,
            command_period_s: 0.1,
            navigate: NavigateParams::default()
        }
    }
}

impl Default for NavigateParams {
    fn default() -> Self {
        Self {
            default_speed: 0.6,
            default_waypoint_radius: 1.0,
            speed_gains: PidGains::new(0.1, 0.0, 0.01),
            rotation_gains: PidGains::new(0.03, 0.0, 0.01)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_params_file() {
        let params: AutoParams = util::params::from_str(
            include_str!("../../../params/auto.toml")
        ).unwrap();

        assert_eq!(params.navigate.default_speed, 0.6);
        assert_eq!(params.navigate.rotation_gains, PidGains::new(0.03, 0.0, 0.01));
    }
}
