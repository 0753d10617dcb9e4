//! Path length, route truncation, and top-of-climb/top-of-descent placement.

use trajsim_core::constants::{TOP_OF_CLIMB_PT, TOP_OF_DESCENT_PT};
use trajsim_geodesy::{destination, distance_ft, heading_rad};

use crate::types::{AltitudeDescriptor, RoutePoint};

/// Sum of great-circle leg lengths (ft) measured on the surface sphere.
pub fn path_length_ft(route: &[RoutePoint]) -> f64 {
    route
        .windows(2)
        .map(|w| distance_ft(w[0].lat_deg, w[0].lon_deg, w[1].lat_deg, w[1].lon_deg, 0.0))
        .sum()
}

/// Drop points from the middle so at most `max_len` remain. Returns the number dropped.
pub fn truncate_middle(route: &[RoutePoint], max_len: usize) -> (Vec<RoutePoint>, usize) {
    if route.len() <= max_len || max_len < 2 {
        return (route.to_vec(), 0);
    }
    let dropped = route.len() - max_len;
    let start = (route.len() / 2).saturating_sub(dropped / 2).max(1);
    let start = start.min(route.len() - 1 - dropped);
    let kept = route[..start]
        .iter()
        .chain(&route[start + dropped..])
        .cloned()
        .collect();
    (kept, dropped)
}

/// Insert the top-of-climb point `climb_dist_ft` along the route.
pub fn insert_top_of_climb(
    route: &[RoutePoint],
    climb_dist_ft: f64,
    cruise_alt_ft: f64,
) -> (Vec<RoutePoint>, Option<usize>) {
    insert_at_distance(route, TOP_OF_CLIMB_PT, climb_dist_ft, cruise_alt_ft, 1)
}

/// Insert the top-of-descent point `descent_dist_ft` before the end of the route, after
/// index `after` when a top of climb precedes it.
pub fn insert_top_of_descent(
    route: &[RoutePoint],
    descent_dist_ft: f64,
    cruise_alt_ft: f64,
    after: Option<usize>,
) -> (Vec<RoutePoint>, Option<usize>) {
    let target = path_length_ft(route) - descent_dist_ft;
    let min_index = after.map_or(1, |i| i + 1);
    insert_at_distance(route, TOP_OF_DESCENT_PT, target, cruise_alt_ft, min_index)
}

/// Split the leg containing `target_ft` (measured from the first point) with a new point.
///
/// The new point goes before the first node whose cumulative distance is strictly greater
/// than the target, clamped to `[min_index, len - 1]` so it never leads or trails the route.
fn insert_at_distance(
    route: &[RoutePoint],
    name: &str,
    target_ft: f64,
    alt_ft: f64,
    min_index: usize,
) -> (Vec<RoutePoint>, Option<usize>) {
    let mut kept: Vec<RoutePoint> = route.iter().filter(|p| p.name != name).cloned().collect();
    if kept.len() < 2 || min_index > kept.len() - 1 {
        return (kept, None);
    }

    let mut cumulative = 0.0;
    let mut split = (kept.len() - 1, 0.0);
    for i in 1..kept.len() {
        let leg = distance_ft(
            kept[i - 1].lat_deg,
            kept[i - 1].lon_deg,
            kept[i].lat_deg,
            kept[i].lon_deg,
            0.0,
        );
        split = (i, cumulative);
        if i >= min_index && cumulative + leg > target_ft {
            break;
        }
        cumulative += leg;
    }
    let (index, leg_start_ft) = split;

    let from = &kept[index - 1];
    let to = &kept[index];
    let leg = distance_ft(from.lat_deg, from.lon_deg, to.lat_deg, to.lon_deg, 0.0);
    let offset = (target_ft - leg_start_ft).clamp(0.0, leg);
    let course = heading_rad(from.lat_deg, from.lon_deg, to.lat_deg, to.lon_deg);
    let (lat, lon) = destination(from.lat_deg, from.lon_deg, course, offset, 0.0);

    let mut point = RoutePoint::synthetic(name.to_string(), lat, lon, alt_ft, from);
    point.alt_desc = AltitudeDescriptor::At;
    point.alt_1_ft = Some(alt_ft);
    kept.insert(index, point);
    (kept, Some(index))
}
