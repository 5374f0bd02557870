//! Utility maths functions
//!
//! All headings in the swerve software are compass style: degrees, measured
//! clockwise from the forward (+Y) axis, so that a unit vector at heading `h`
//! is `(sin h, cos h)`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Degrees in a full turn.
pub const FULL_TURN_DEG: f64 = 360.0;

/// Degrees in half a turn.
pub const HALF_TURN_DEG: f64 = 180.0;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where 
    T: Float 
{
    target_range.0 
        + ((value - source_range.0) 
        * (target_range.1 - target_range.0) 
        / (source_range.1 - source_range.0))
}

/// Clamp `value` into `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T 
where
    T: Float
{
    if value > max {
        max
    }
    else if value < min {
        min
    }
    else {
        value
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
/// 
/// This function is taken from the std library as num is missing it.
///
/// Due to floating point round-off the result can be exactly `rhs.abs()` when
/// `lhs` is a very small negative number. Callers needing a half-open range
/// must guard against this.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Normalise a heading into `[0, 360)` degrees.
///
/// Non-finite headings normalise to 0.
pub fn norm_deg(heading_deg: f64) -> f64 {
    if !heading_deg.is_finite() {
        return 0.0;
    }

    let h = rem_euclid(heading_deg, FULL_TURN_DEG);

    // rem_euclid round-off can land exactly on the upper bound
    if h >= FULL_TURN_DEG {
        0.0
    }
    else {
        h
    }
}

/// Get the shortest signed angular error from `current_deg` to `target_deg`.
///
/// The result is in `(-180, 180]`, positive when `target_deg` lies clockwise
/// of `current_deg`.
pub fn get_ang_err_deg(target_deg: f64, current_deg: f64) -> f64 {
    let err = norm_deg(target_deg - current_deg);

    if err > HALF_TURN_DEG {
        err - FULL_TURN_DEG
    }
    else {
        err
    }
}

/// Convert a cartesian `(x, y)` vector into `(magnitude, heading_deg)`.
///
/// The heading of the zero vector is 0.
pub fn to_polar_deg(x: f64, y: f64) -> (f64, f64) {
    let magn = (x.powi(2) + y.powi(2)).sqrt();
    let heading_deg = norm_deg(x.atan2(y).to_degrees());

    (magn, heading_deg)
}

/// Convert a `(magnitude, heading_deg)` pair into a cartesian `(x, y)`
/// vector.
pub fn from_polar_deg(magn: f64, heading_deg: f64) -> (f64, f64) {
    let heading_rad = heading_deg.to_radians();

    (magn * heading_rad.sin(), magn * heading_rad.cos())
}
