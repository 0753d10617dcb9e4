//! Geodesy kernel: great-circle navigation, local NED frames, and intercept solvers.
//!
//! Everything here is a pure function of its inputs. Angles cross the API in degrees for
//! positions and radians for headings/courses, matching how waypoint data is stored.

pub mod great_circle;
pub mod intercept;
pub mod ned;

pub use great_circle::{destination, distance_ft, heading_rad};
pub use intercept::{dead_reckon_to_altitude, line_sphere_intercept, two_line_intercept};
pub use ned::{LocalFrame, geodetic_to_ned, ned_to_geodetic};

/// Geodetic position: latitude/longitude in degrees, altitude in feet above the ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geodetic {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_ft: f64,
}

impl Geodetic {
    pub fn new(lat_deg: f64, lon_deg: f64, alt_ft: f64) -> Self {
        Self {
            lat_deg,
            lon_deg,
            alt_ft,
        }
    }
}

/// Errors raised by the solvers.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GeodesyError {
    #[error("courses are parallel; the lines never intersect")]
    ParallelCourses,
    #[error("geodetic latitude did not converge after {0} iterations")]
    NoConvergence(usize),
    #[error("rate of climb {roc_fps} ft/s and speed {tas_knots} kt cannot reach the target altitude")]
    InvalidClimb { roc_fps: f64, tas_knots: f64 },
}
