//! WGS84 geodetic ↔ ECEF ↔ local North-East-Down conversions.

use std::f64::consts::FRAC_PI_2;

use trajsim_core::constants::{WGS84_ECCENTRICITY_SQ, WGS84_SEMI_MAJOR_FT};
use trajsim_core::vector::{Vector3, sub};

use crate::{GeodesyError, Geodetic};

const LATITUDE_TOLERANCE_RAD: f64 = 1e-6;
const MAX_ITERATIONS: usize = 64;
// Below this distance from the polar axis (ft) the latitude is pinned to ±90°.
const POLAR_AXIS_EPS_FT: f64 = 1e-3;

/// Prime-vertical radius of curvature at `lat_rad`.
#[inline]
fn prime_vertical_radius(lat_rad: f64) -> f64 {
    WGS84_SEMI_MAJOR_FT / (1.0 - WGS84_ECCENTRICITY_SQ * lat_rad.sin().powi(2)).sqrt()
}

/// Convert a geodetic position to Earth-centered Earth-fixed coordinates (ft).
pub fn geodetic_to_ecef(p: &Geodetic) -> Vector3 {
    let lat = p.lat_deg.to_radians();
    let lon = p.lon_deg.to_radians();
    let rn = prime_vertical_radius(lat);
    [
        (rn + p.alt_ft) * lat.cos() * lon.cos(),
        (rn + p.alt_ft) * lat.cos() * lon.sin(),
        (rn * (1.0 - WGS84_ECCENTRICITY_SQ) + p.alt_ft) * lat.sin(),
    ]
}

/// Convert ECEF coordinates back to geodetic by fixed-point iteration on latitude.
pub fn ecef_to_geodetic(ecef: &Vector3) -> Result<Geodetic, GeodesyError> {
    let [x, y, z] = *ecef;
    let lon = y.atan2(x);
    let p = x.hypot(y);

    if p < POLAR_AXIS_EPS_FT {
        let lat = FRAC_PI_2.copysign(z);
        let b = WGS84_SEMI_MAJOR_FT * (1.0 - WGS84_ECCENTRICITY_SQ).sqrt();
        return Ok(Geodetic::new(lat.to_degrees(), lon.to_degrees(), z.abs() - b));
    }

    let mut lat = z.atan2(p * (1.0 - WGS84_ECCENTRICITY_SQ));
    for _ in 0..MAX_ITERATIONS {
        let rn = prime_vertical_radius(lat);
        let h = altitude_at(p, z, lat, rn);
        let next = (z * (rn + h)).atan2(p * (rn * (1.0 - WGS84_ECCENTRICITY_SQ) + h));
        let converged = (next - lat).abs() < LATITUDE_TOLERANCE_RAD;
        lat = next;
        if converged {
            let rn = prime_vertical_radius(lat);
            let h = altitude_at(p, z, lat, rn);
            return Ok(Geodetic::new(lat.to_degrees(), lon.to_degrees(), h));
        }
    }
    Err(GeodesyError::NoConvergence(MAX_ITERATIONS))
}

fn altitude_at(p: f64, z: f64, lat: f64, rn: f64) -> f64 {
    // cos(lat) vanishes near the poles; switch to the sine form there.
    if lat.cos().abs() > 1e-3 {
        p / lat.cos() - rn
    } else {
        z / lat.sin() - rn * (1.0 - WGS84_ECCENTRICITY_SQ)
    }
}

/// Local tangent frame anchored at a reference point.
#[derive(Debug, Clone, Copy)]
pub struct LocalFrame {
    reference: Geodetic,
    origin_ecef: Vector3,
    sin_lat: f64,
    cos_lat: f64,
    sin_lon: f64,
    cos_lon: f64,
}

impl LocalFrame {
    pub fn new(reference: Geodetic) -> Self {
        let lat = reference.lat_deg.to_radians();
        let lon = reference.lon_deg.to_radians();
        Self {
            reference,
            origin_ecef: geodetic_to_ecef(&reference),
            sin_lat: lat.sin(),
            cos_lat: lat.cos(),
            sin_lon: lon.sin(),
            cos_lon: lon.cos(),
        }
    }

    pub fn reference(&self) -> Geodetic {
        self.reference
    }

    /// Express `p` as a North-East-Down offset (ft) from the frame origin.
    pub fn to_ned(&self, p: &Geodetic) -> Vector3 {
        let d = sub(&geodetic_to_ecef(p), &self.origin_ecef);
        let north = -self.sin_lat * self.cos_lon * d[0] - self.sin_lat * self.sin_lon * d[1]
            + self.cos_lat * d[2];
        let east = -self.sin_lon * d[0] + self.cos_lon * d[1];
        let down = -self.cos_lat * self.cos_lon * d[0] - self.cos_lat * self.sin_lon * d[1]
            - self.sin_lat * d[2];
        [north, east, down]
    }

    /// Map a North-East-Down offset back to a geodetic position.
    pub fn to_geodetic(&self, ned: &Vector3) -> Result<Geodetic, GeodesyError> {
        let [n, e, d] = *ned;
        let dx = -self.sin_lat * self.cos_lon * n - self.sin_lon * e - self.cos_lat * self.cos_lon * d;
        let dy = -self.sin_lat * self.sin_lon * n + self.cos_lon * e - self.cos_lat * self.sin_lon * d;
        let dz = self.cos_lat * n - self.sin_lat * d;
        ecef_to_geodetic(&[
            self.origin_ecef[0] + dx,
            self.origin_ecef[1] + dy,
            self.origin_ecef[2] + dz,
        ])
    }
}

/// Convenience wrapper for a one-off conversion into the frame at `reference`.
pub fn geodetic_to_ned(p: &Geodetic, reference: &Geodetic) -> Vector3 {
    LocalFrame::new(*reference).to_ned(p)
}

/// Convenience wrapper for a one-off conversion out of the frame at `reference`.
pub fn ned_to_geodetic(ned: &Vector3, reference: &Geodetic) -> Result<Geodetic, GeodesyError> {
    LocalFrame::new(*reference).to_geodetic(ned)
}
