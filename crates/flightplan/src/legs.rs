//! Replacement of parametric procedure legs by concrete points.
//!
//! Heading/course legs end at an altitude, a DME distance, a radial, or an intercept
//! rather than at a fix. Each is flown from the previous point using the aircraft's
//! climb performance and replaced by a synthetic `HEADING OR COURSE_...` point. Legs
//! without a fix of their own are never emitted.

use tracing::warn;
use trajsim_adb::{MassCategory, PerformanceTable};
use trajsim_core::constants::HEADING_OR_COURSE_PREFIX;
use trajsim_core::units::{fpm_to_fps, knots_to_fps, nm_to_ft};
use trajsim_core::vector::scale;
use trajsim_geodesy::{
    Geodetic, LocalFrame, dead_reckon_to_altitude, line_sphere_intercept, two_line_intercept,
};

use crate::compiler::CompileError;
use crate::navdata::NavDatabase;
use crate::types::{PathTerminator, RoutePoint};

/// Where a parametric leg starts and whether its start replaces the last emitted point.
#[derive(Debug, Clone, Copy)]
struct LegStart {
    position: Geodetic,
    replaces_last: bool,
}

#[derive(Debug, Clone, Copy)]
struct PendingIntercept {
    start: LegStart,
    course_rad: f64,
}

pub struct LegResolver<'a> {
    table: &'a PerformanceTable,
    navdata: &'a NavDatabase,
    climb_divisor: f64,
}

impl<'a> LegResolver<'a> {
    pub fn new(table: &'a PerformanceTable, navdata: &'a NavDatabase, climb_divisor: f64) -> Self {
        Self {
            table,
            navdata,
            climb_divisor,
        }
    }

    /// Resolve every parametric leg of `route`, returning a new route.
    ///
    /// `initial_alt_ft` seeds the running altitude used when a leg start has no estimate.
    pub fn resolve(
        &self,
        route: &[RoutePoint],
        initial_alt_ft: f64,
        callsign: &str,
    ) -> Result<Vec<RoutePoint>, CompileError> {
        let mut out: Vec<RoutePoint> = Vec::with_capacity(route.len());
        let mut running_alt = initial_alt_ft;
        let mut pending: Option<PendingIntercept> = None;

        for point in route {
            let intercept = pending.take();
            match point.path_terminator {
                Some(PathTerminator::VA | PathTerminator::CA) => {
                    self.emit_if_fixed(&mut out, point);
                    let start = leg_start(&out, point, running_alt);
                    self.resolve_altitude_leg(&mut out, point, start, callsign)?;
                }
                Some(PathTerminator::VD | PathTerminator::CD) => {
                    self.emit_if_fixed(&mut out, point);
                    let start = leg_start(&out, point, running_alt);
                    self.resolve_dme_leg(&mut out, point, start, callsign)?;
                }
                Some(PathTerminator::VR | PathTerminator::CR) => {
                    self.emit_if_fixed(&mut out, point);
                    let start = leg_start(&out, point, running_alt);
                    self.resolve_radial_leg(&mut out, point, start, callsign)?;
                }
                Some(PathTerminator::VI | PathTerminator::CI) => {
                    self.emit_if_fixed(&mut out, point);
                    match point.course_true_deg {
                        Some(course) => {
                            pending = Some(PendingIntercept {
                                start: leg_start(&out, point, running_alt),
                                course_rad: course.to_radians(),
                            })
                        }
                        None => warn!(%callsign, leg = %point.name, "intercept leg without a course"),
                    }
                }
                Some(PathTerminator::CF | PathTerminator::DF) if intercept.is_some() => {
                    if let (Some(pi), Some(course)) = (intercept, point.course_true_deg) {
                        self.resolve_intercept(&mut out, point, pi, course.to_radians(), callsign)?;
                    }
                    out.push(point.clone());
                }
                _ => self.emit_if_fixed(&mut out, point),
            }
            if let Some(alt) = point.altitude_estimate_ft() {
                running_alt = alt;
            }
        }
        Ok(out)
    }

    fn emit_if_fixed(&self, out: &mut Vec<RoutePoint>, point: &RoutePoint) {
        if !point.floating {
            out.push(point.clone());
        }
    }

    /// Climb speed (kt) and rate of climb (ft/s) at the start of a heading leg.
    fn climb_performance(&self, point: &RoutePoint, start: &Geodetic) -> Result<(f64, f64), CompileError> {
        let alt = start.alt_ft.max(0.0);
        let tas = match point.speed_limit_knots {
            Some(limit) => limit,
            None => self.table.climb_tas(alt)?,
        };
        let roc = fpm_to_fps(self.table.climb_rate(alt, MassCategory::Nominal)?) / self.climb_divisor;
        Ok((tas, roc))
    }

    fn resolve_altitude_leg(
        &self,
        out: &mut Vec<RoutePoint>,
        point: &RoutePoint,
        start: LegStart,
        callsign: &str,
    ) -> Result<(), CompileError> {
        let (Some(target), Some(course)) = (point.alt_1_ft, point.course_true_deg) else {
            warn!(%callsign, leg = %point.name, "altitude leg without target altitude or course");
            return Ok(());
        };
        let (tas, roc) = self.climb_performance(point, &start.position)?;
        let end = dead_reckon_to_altitude(&start.position, course.to_radians(), target, tas, roc)?;
        let name = format!("{HEADING_OR_COURSE_PREFIX}_TO_ALTITUDE_{}", point.name);
        push_synthetic(out, start, RoutePoint::synthetic(name, end.lat_deg, end.lon_deg, end.alt_ft, point));
        Ok(())
    }

    fn resolve_dme_leg(
        &self,
        out: &mut Vec<RoutePoint>,
        point: &RoutePoint,
        start: LegStart,
        callsign: &str,
    ) -> Result<(), CompileError> {
        let (Some(navaid_name), Some(course), Some(distance)) = (
            point.recommended_navaid.as_deref(),
            point.course_true_deg,
            point.distance_nm,
        ) else {
            warn!(%callsign, leg = %point.name, "DME leg without navaid, course, or distance");
            return Ok(());
        };
        let Some(navaid) = self.navdata.fix(navaid_name) else {
            warn!(%callsign, leg = %point.name, navaid = %navaid_name, "DME leg navaid not found");
            return Ok(());
        };

        let (tas, roc) = self.climb_performance(point, &start.position)?;
        let fpa = (roc / knots_to_fps(tas)).clamp(-1.0, 1.0).asin();
        let (sc, cc) = course.to_radians().sin_cos();
        let (sg, cg) = fpa.sin_cos();
        let radius = nm_to_ft(distance);

        let frame = LocalFrame::new(start.position);
        let center = frame.to_ned(&navaid.position(start.position.alt_ft));
        let ahead = scale(&[cc * cg, sc * cg, -sg], radius);
        let Some(hit) = line_sphere_intercept(&[0.0; 3], &ahead, &center, radius) else {
            warn!(%callsign, leg = %point.name, "DME arc not reached; leg skipped");
            return Ok(());
        };
        let end = frame.to_geodetic(&hit)?;
        let name = format!(
            "{HEADING_OR_COURSE_PREFIX}_TO_DME_DISTANCE_{}_{}",
            navaid.name, point.name
        );
        push_synthetic(out, start, RoutePoint::synthetic(name, end.lat_deg, end.lon_deg, end.alt_ft, point));
        Ok(())
    }

    fn resolve_radial_leg(
        &self,
        out: &mut Vec<RoutePoint>,
        point: &RoutePoint,
        start: LegStart,
        callsign: &str,
    ) -> Result<(), CompileError> {
        let (Some(navaid_name), Some(course), Some(theta)) = (
            point.recommended_navaid.as_deref(),
            point.course_true_deg,
            point.theta_true_deg,
        ) else {
            warn!(%callsign, leg = %point.name, "radial leg without navaid, course, or radial");
            return Ok(());
        };
        let Some(navaid) = self.navdata.fix(navaid_name) else {
            warn!(%callsign, leg = %point.name, navaid = %navaid_name, "radial leg navaid not found");
            return Ok(());
        };
        let radial_origin = navaid.position(start.position.alt_ft);
        match two_line_intercept(&start.position, course.to_radians(), &radial_origin, theta.to_radians()) {
            Ok(end) => {
                let name = format!(
                    "{HEADING_OR_COURSE_PREFIX}_TO_RADIAL_{}_{}",
                    navaid.name, point.name
                );
                push_synthetic(out, start, RoutePoint::synthetic(name, end.lat_deg, end.lon_deg, end.alt_ft, point));
            }
            Err(e) => warn!(%callsign, leg = %point.name, error = %e, "radial leg skipped"),
        }
        Ok(())
    }

    fn resolve_intercept(
        &self,
        out: &mut Vec<RoutePoint>,
        point: &RoutePoint,
        pending: PendingIntercept,
        course_rad: f64,
        callsign: &str,
    ) -> Result<(), CompileError> {
        let fix = Geodetic::new(point.lat_deg, point.lon_deg, pending.start.position.alt_ft);
        match two_line_intercept(&pending.start.position, pending.course_rad, &fix, course_rad) {
            Ok(end) => {
                let prev = out.last().map_or("", |p| p.name.as_str());
                let name = format!("{HEADING_OR_COURSE_PREFIX}_TO_INTERCEPT_{prev}_{}", point.name);
                let synthetic = RoutePoint::synthetic(
                    name,
                    end.lat_deg,
                    end.lon_deg,
                    pending.start.position.alt_ft,
                    point,
                );
                push_synthetic(out, pending.start, synthetic);
            }
            Err(e) => warn!(%callsign, leg = %point.name, error = %e, "intercept not computed"),
        }
        Ok(())
    }
}

/// Start of a leg: the last emitted point, or the leg's own position when nothing is out yet.
fn leg_start(out: &[RoutePoint], point: &RoutePoint, running_alt: f64) -> LegStart {
    match out.last() {
        Some(last) => LegStart {
            position: Geodetic::new(
                last.lat_deg,
                last.lon_deg,
                last.altitude_estimate_ft().unwrap_or(running_alt),
            ),
            replaces_last: last.is_heading_or_course(),
        },
        None => LegStart {
            position: Geodetic::new(point.lat_deg, point.lon_deg, running_alt),
            replaces_last: false,
        },
    }
}

fn push_synthetic(out: &mut Vec<RoutePoint>, start: LegStart, point: RoutePoint) {
    if start.replaces_last {
        out.pop();
    }
    out.push(point);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navdata::fixtures;
    use crate::route::parse_route;
    use trajsim_geodesy::{distance_ft, heading_rad};

    fn resolve(route: &str) -> Vec<RoutePoint> {
        let db = fixtures::navdata();
        let adb = fixtures::adb();
        let table = adb.lookup("B733").unwrap();
        let parsed = parse_route(route, &db).unwrap();
        LegResolver::new(table, &db, 3.0)
            .resolve(&parsed.points, 13.0, "TEST")
            .unwrap()
    }

    #[test]
    fn heading_to_altitude_then_intercept() {
        let out = resolve("KSFO.RW01R.PORTE3.BSR.KLAX");
        let names: Vec<&str> = out.iter().map(|p| p.name.as_str()).collect();
        // The VA synthetic is replaced by the intercept computed from it.
        assert_eq!(
            names,
            [
                "RW01R",
                "HEADING OR COURSE_TO_INTERCEPT_HEADING OR COURSE_TO_ALTITUDE_RW01R_PORTE",
                "PORTE",
                "BSR"
            ]
        );
        assert!(out.iter().all(|p| !p.floating));

        // Intercept lies due north of PORTE, on its 180 true inbound course.
        let x = &out[1];
        assert!((x.lon_deg - (-122.47)).abs() < 1e-3, "lon {}", x.lon_deg);
        assert!(x.lat_deg > 37.49);
        let inbound = heading_rad(x.lat_deg, x.lon_deg, 37.49, -122.47).to_degrees();
        assert!((inbound - 180.0).abs() < 0.5, "inbound {inbound}");
    }

    #[test]
    fn altitude_leg_climbs_along_runway_course() {
        let db = fixtures::navdata();
        let adb = fixtures::adb();
        let table = adb.lookup("B733").unwrap();
        let mut runway = RoutePoint::enroute("RW01R", 37.6067, -122.381);
        runway.alt_ft = Some(13.0);
        runway.path_terminator = Some(PathTerminator::VA);
        runway.alt_1_ft = Some(1013.0);
        runway.course_true_deg = Some(28.0);
        let out = LegResolver::new(table, &db, 3.0)
            .resolve(&[runway], 13.0, "TEST")
            .unwrap();
        assert_eq!(out.len(), 2);
        let end = &out[1];
        assert_eq!(end.name, "HEADING OR COURSE_TO_ALTITUDE_RW01R");
        assert_eq!(end.alt_ft, Some(1013.0));
        let course = heading_rad(37.6067, -122.381, end.lat_deg, end.lon_deg).to_degrees();
        assert!((course - 28.0).abs() < 0.1, "course {course}");
        // 1000 ft at ~833 fpm and ~170 kt is a little over 3.4 nm.
        let d = distance_ft(37.6067, -122.381, end.lat_deg, end.lon_deg, 13.0);
        assert!(d > 15_000.0 && d < 25_000.0, "distance {d}");
    }

    #[test]
    fn dme_leg_ends_on_the_arc() {
        let db = fixtures::navdata();
        let adb = fixtures::adb();
        let table = adb.lookup("B733").unwrap();
        let mut start = RoutePoint::enroute("PORTE", 37.49, -122.47);
        start.alt_ft = Some(6000.0);
        let mut dme = RoutePoint::enroute("PORTE3_CD_3", 37.49, -122.47);
        dme.floating = true;
        dme.path_terminator = Some(PathTerminator::CD);
        dme.recommended_navaid = Some("SJC".into());
        dme.course_true_deg = Some(120.0);
        dme.distance_nm = Some(10.0);
        let out = LegResolver::new(table, &db, 3.0)
            .resolve(&[start, dme], 6000.0, "TEST")
            .unwrap();
        assert_eq!(out.len(), 2);
        let end = &out[1];
        assert_eq!(end.name, "HEADING OR COURSE_TO_DME_DISTANCE_SJC_PORTE3_CD_3");
        let d = distance_ft(end.lat_deg, end.lon_deg, 37.3747, -121.945, 0.0);
        assert!((d - nm_to_ft(10.0)).abs() < 600.0, "distance to SJC {d}");
    }

    #[test]
    fn parallel_radial_leg_is_skipped() {
        let db = fixtures::navdata();
        let adb = fixtures::adb();
        let table = adb.lookup("B733").unwrap();
        let mut start = RoutePoint::enroute("PORTE", 37.49, -122.47);
        start.alt_ft = Some(6000.0);
        let mut radial = RoutePoint::enroute("R", 37.49, -122.47);
        radial.floating = true;
        radial.path_terminator = Some(PathTerminator::CR);
        radial.recommended_navaid = Some("SJC".into());
        radial.course_true_deg = Some(90.0);
        radial.theta_true_deg = Some(90.0);
        let out = LegResolver::new(table, &db, 3.0)
            .resolve(&[start, radial], 6000.0, "TEST")
            .unwrap();
        assert_eq!(out.len(), 1);
    }
}
