//! Core units, constants, and shared primitives for the trajsim workspace.

/// Physical and operational constants. Distances are in feet unless stated otherwise.
pub mod constants {
    /// Mean spherical Earth radius used for great-circle navigation (ft).
    pub const RADIUS_EARTH_FT: f64 = 20_925_524.9;
    /// WGS84 semi-major axis (ft).
    pub const WGS84_SEMI_MAJOR_FT: f64 = 20_925_646.325;
    /// WGS84 first eccentricity squared.
    pub const WGS84_ECCENTRICITY_SQ: f64 = 0.006_694_379_990_14;
    /// Feet per nautical mile.
    pub const FEET_PER_NM: f64 = 6_076.115_49;
    /// Knots to feet per second.
    pub const KNOTS_TO_FPS: f64 = 1.687_81;
    /// Knots to feet per minute, as used by the performance tables.
    pub const KNOTS_TO_FEET_PER_MIN: f64 = 1.687_809_86 * 60.0;
    /// Terminal-area ceiling separating climb-out/approach from the en-route climb/descent.
    pub const TRACON_ALT_FT: f64 = 10_000.0;
    /// Lowest cruise altitude accepted by the cruise-altitude search.
    pub const MIN_CRUISE_ALTITUDE_FT: f64 = 10_000.0;
    /// Capacity of a compiled airborne route, including TOC and TOD.
    pub const MAX_FLIGHT_PLAN_LENGTH: usize = 110;
    /// Name of the synthetic top-of-climb waypoint.
    pub const TOP_OF_CLIMB_PT: &str = "TOP_OF_CLIMB_PT";
    /// Name of the synthetic top-of-descent waypoint.
    pub const TOP_OF_DESCENT_PT: &str = "TOP_OF_DESCENT_PT";
    /// Prefix shared by every synthetic point produced from a heading/course leg.
    pub const HEADING_OR_COURSE_PREFIX: &str = "HEADING OR COURSE";
}

/// Basic unit conversion helpers.
pub mod units {
    use super::constants::{FEET_PER_NM, KNOTS_TO_FPS};

    /// Convert nautical miles to feet.
    #[inline]
    pub fn nm_to_ft(v: f64) -> f64 {
        v * FEET_PER_NM
    }

    /// Convert feet to nautical miles.
    #[inline]
    pub fn ft_to_nm(v: f64) -> f64 {
        v / FEET_PER_NM
    }

    /// Convert knots to feet per second.
    #[inline]
    pub fn knots_to_fps(v: f64) -> f64 {
        v * KNOTS_TO_FPS
    }

    /// Convert feet per second to knots.
    #[inline]
    pub fn fps_to_knots(v: f64) -> f64 {
        v / KNOTS_TO_FPS
    }

    /// Convert feet per minute to feet per second.
    #[inline]
    pub fn fpm_to_fps(v: f64) -> f64 {
        v / 60.0
    }
}

/// Angle helpers. Headings are clockwise from true north.
pub mod angle {
    use std::f64::consts::{PI, TAU};

    /// Normalize an angle into `[0, 2π)`.
    #[inline]
    pub fn normalize_rad(a: f64) -> f64 {
        let r = a.rem_euclid(TAU);
        if r >= TAU { 0.0 } else { r }
    }

    /// Normalize an angle into `[0, 360)`.
    #[inline]
    pub fn normalize_deg(a: f64) -> f64 {
        let r = a.rem_euclid(360.0);
        if r >= 360.0 { 0.0 } else { r }
    }

    /// Absolute angular difference folded into `[0, π]`.
    #[inline]
    pub fn abs_diff_rad(a: f64, b: f64) -> f64 {
        let d = normalize_rad(a - b);
        if d > PI { TAU - d } else { d }
    }
}

/// Minimal vector helpers to avoid ad-hoc `[f64; 3]` math everywhere.
pub mod vector {
    /// Alias for a 3D vector in feet, typically a local NED offset.
    pub type Vector3 = [f64; 3];

    /// Euclidean norm of a vector.
    #[inline]
    pub fn norm(v: &Vector3) -> f64 {
        dot(v, v).sqrt()
    }

    /// Dot product of two vectors.
    #[inline]
    pub fn dot(a: &Vector3, b: &Vector3) -> f64 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
    }

    /// Vector addition.
    #[inline]
    pub fn add(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
    }

    /// Vector subtraction.
    #[inline]
    pub fn sub(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    /// Scale a vector by a scalar.
    #[inline]
    pub fn scale(v: &Vector3, s: f64) -> Vector3 {
        [v[0] * s, v[1] * s, v[2] * s]
    }
}

#[cfg(test)]
mod tests {
    use super::angle::{abs_diff_rad, normalize_deg, normalize_rad};
    use std::f64::consts::PI;

    #[test]
    fn normalizes_negative_angles() {
        assert!((normalize_rad(-PI / 2.0) - 1.5 * PI).abs() < 1e-12);
        assert!((normalize_deg(-90.0) - 270.0).abs() < 1e-12);
        assert_eq!(normalize_deg(360.0), 0.0);
    }

    #[test]
    fn folds_differences_across_north() {
        let d = abs_diff_rad(0.1, 2.0 * PI - 0.1);
        assert!((d - 0.2).abs() < 1e-12, "diff {d}");
    }
}
