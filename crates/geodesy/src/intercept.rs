//! Intercept solvers used to resolve parametric procedure legs into concrete points.

use trajsim_core::units::knots_to_fps;
use trajsim_core::vector::{Vector3, add, dot, scale, sub};

use crate::great_circle::destination;
use crate::ned::LocalFrame;
use crate::{GeodesyError, Geodetic};

// sin of the angle between two courses below which they are treated as parallel.
const PARALLEL_EPS: f64 = 1e-9;

/// Near intersection of the line through `p0`/`p1` with a sphere.
///
/// The returned point is the root closest to `p0` along the infinite line. `None` means
/// the line misses the sphere (negative discriminant) or `p0 == p1`.
pub fn line_sphere_intercept(
    p0: &Vector3,
    p1: &Vector3,
    center: &Vector3,
    radius: f64,
) -> Option<Vector3> {
    let d = sub(p1, p0);
    let m = sub(p0, center);
    let a = dot(&d, &d);
    if a == 0.0 {
        return None;
    }
    let b = 2.0 * dot(&d, &m);
    let c = dot(&m, &m) - radius * radius;
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let root = disc.sqrt();
    let t1 = (-b + root) / (2.0 * a);
    let t2 = (-b - root) / (2.0 * a);
    let t = if t1.abs() <= t2.abs() { t1 } else { t2 };
    Some(add(p0, &scale(&d, t)))
}

/// Intersection of two courses, each a straight line in the tangent plane at `p1`.
///
/// The altitude of the result is the mean of both inputs.
pub fn two_line_intercept(
    p1: &Geodetic,
    course1_rad: f64,
    p2: &Geodetic,
    course2_rad: f64,
) -> Result<Geodetic, GeodesyError> {
    let frame = LocalFrame::new(Geodetic::new(p1.lat_deg, p1.lon_deg, 0.0));
    let q = frame.to_ned(&Geodetic::new(p2.lat_deg, p2.lon_deg, 0.0));

    let (s1, c1) = course1_rad.sin_cos();
    let (s2, c2) = course2_rad.sin_cos();
    let cross = c1 * s2 - s1 * c2;
    if cross.abs() < PARALLEL_EPS {
        return Err(GeodesyError::ParallelCourses);
    }
    // p1 + s·u1 = q + t·u2, solved for s with the 2-D cross product.
    let s = (q[0] * s2 - q[1] * c2) / cross;
    let point = frame.to_geodetic(&[s * c1, s * s1, 0.0])?;
    Ok(Geodetic::new(
        point.lat_deg,
        point.lon_deg,
        0.5 * (p1.alt_ft + p2.alt_ft),
    ))
}

/// Fly `course_rad` from `start` until `target_alt_ft` is reached.
///
/// The vertical profile is a constant rate of climb `roc_fps` at `tas_knots`, so the
/// horizontal speed is `v·cos(fpa)` with `fpa = asin(roc / v)`. A start above the target
/// returns the start position at the target altitude.
pub fn dead_reckon_to_altitude(
    start: &Geodetic,
    course_rad: f64,
    target_alt_ft: f64,
    tas_knots: f64,
    roc_fps: f64,
) -> Result<Geodetic, GeodesyError> {
    let v = knots_to_fps(tas_knots);
    if roc_fps <= 0.0 || v <= roc_fps {
        return Err(GeodesyError::InvalidClimb { roc_fps, tas_knots });
    }
    let fpa = (roc_fps / v).asin();
    let dh = (target_alt_ft - start.alt_ft).max(0.0);
    let dt = dh / roc_fps;
    let range = v * fpa.cos() * dt;
    let (lat, lon) = destination(start.lat_deg, start.lon_deg, course_rad, range, start.alt_ft);
    Ok(Geodetic::new(lat, lon, target_alt_ft))
}
