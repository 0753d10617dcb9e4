//! Spherical great-circle distance, initial heading, and direct destination.

use trajsim_core::angle::normalize_rad;
use trajsim_core::constants::RADIUS_EARTH_FT;

/// Great-circle distance (ft) between two points on a sphere raised by `alt_ft`.
pub fn distance_ft(lat1_deg: f64, lon1_deg: f64, lat2_deg: f64, lon2_deg: f64, alt_ft: f64) -> f64 {
    let lat1 = lat1_deg.to_radians();
    let lat2 = lat2_deg.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (lon2_deg - lon1_deg).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    (RADIUS_EARTH_FT + alt_ft) * 2.0 * a.sqrt().min(1.0).asin()
}

/// Initial great-circle heading from point 1 to point 2, in `[0, 2π)`.
pub fn heading_rad(lat1_deg: f64, lon1_deg: f64, lat2_deg: f64, lon2_deg: f64) -> f64 {
    let lat1 = lat1_deg.to_radians();
    let lat2 = lat2_deg.to_radians();
    let dlon = (lon2_deg - lon1_deg).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    normalize_rad(y.atan2(x))
}

/// Point reached after travelling `range_ft` along `heading_rad` from `(lat, lon)`.
pub fn destination(
    lat_deg: f64,
    lon_deg: f64,
    heading_rad: f64,
    range_ft: f64,
    alt_ft: f64,
) -> (f64, f64) {
    let lat1 = lat_deg.to_radians();
    let lon1 = lon_deg.to_radians();
    let delta = range_ft / (RADIUS_EARTH_FT + alt_ft);

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * heading_rad.cos()).asin();
    let lon2 = lon1
        + (heading_rad.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    let lon2_deg = (lon2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0;
    (lat2.to_degrees(), lon2_deg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn one_degree_of_latitude_is_sixty_nautical_miles() {
        let d = distance_ft(0.0, 0.0, 1.0, 0.0, 0.0);
        let nm = d / trajsim_core::constants::FEET_PER_NM;
        assert!((nm - 60.0).abs() < 0.2, "distance {nm} nm");
    }

    #[test]
    fn due_east_on_equator() {
        let h = heading_rad(0.0, 0.0, 0.0, 1.0);
        assert!((h - PI / 2.0).abs() < 1e-12, "heading {h}");
    }

    #[test]
    fn due_west_is_in_positive_range() {
        let h = heading_rad(10.0, 5.0, 10.0, 4.0);
        assert!(h > PI && h < 2.0 * PI, "heading {h}");
    }

    #[test]
    fn destination_inverts_distance_and_heading() {
        let (lat0, lon0) = (37.6188, -122.375);
        let (lat1, lon1) = (33.9425, -118.4081);
        let range = distance_ft(lat0, lon0, lat1, lon1, 0.0);
        let hdg = heading_rad(lat0, lon0, lat1, lon1);
        let (lat, lon) = destination(lat0, lon0, hdg, range, 0.0);
        assert!((lat - lat1).abs() < 1e-6, "lat {lat}");
        assert!((lon - lon1).abs() < 1e-6, "lon {lon}");
    }
}
