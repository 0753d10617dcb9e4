//! Route-string grammar.
//!
//! ```text
//! ORIGIN.<taxi>.RW01R.PORTE3.BSR.SADDE6.I24R.RW24R.<taxi>.DEST
//! ORIGIN./.RZS.SADDE6.DEST
//! ```
//!
//! Elements are separated by `.`. Angle-bracketed segments hold taxi plans verbatim and may
//! contain dots. `./.` marks a flight already airborne with no departing surface segment.

use thiserror::Error;
use tracing::debug;

use crate::navdata::{Airport, Leg, NavDatabase, Procedure};
use crate::types::{ProcedureType, RoutePoint};

#[derive(Debug, Error, PartialEq)]
pub enum RouteError {
    #[error("route is empty")]
    Empty,
    #[error("unbalanced '<' in route string")]
    UnbalancedBracket,
    #[error("route must start with an origin airport and end with a destination airport")]
    MissingEndpoint,
    #[error("unknown airport {0}")]
    UnknownAirport(String),
    #[error("unknown route element {0}")]
    UnknownElement(String),
    #[error("procedure {procedure} references unknown fix {fix}")]
    UnknownProcedureFix { procedure: String, fix: String },
    #[error("more than two taxi plans in route string")]
    ExtraTaxiPlan,
    #[error("waypoint index {index} out of range for route of {len} points")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Route string split into surface and airborne parts, before leg resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRoute {
    pub origin: String,
    pub destination: String,
    pub departing_taxi_plan: Option<String>,
    pub landing_taxi_plan: Option<String>,
    pub departing_runway: Option<String>,
    pub landing_runway: Option<String>,
    pub airborne_start: bool,
    pub points: Vec<RoutePoint>,
}

#[derive(Debug, PartialEq)]
enum Token<'a> {
    Ident(&'a str),
    Bracket(&'a str),
    AirborneStart,
}

fn tokenize(route: &str) -> Result<Vec<Token<'_>>, RouteError> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < route.len() {
        let rest = &route[i..];
        if rest.starts_with("./.") {
            tokens.push(Token::AirborneStart);
            i += 3;
        } else if let Some(inner) = rest.strip_prefix('<') {
            let close = inner.find('>').ok_or(RouteError::UnbalancedBracket)?;
            tokens.push(Token::Bracket(inner[..close].trim()));
            i += close + 2;
        } else if rest.starts_with('.') || rest.starts_with(char::is_whitespace) {
            i += rest.chars().next().map_or(1, char::len_utf8);
        } else {
            let end = rest
                .find(|c: char| c == '.' || c == '<' || c.is_whitespace())
                .unwrap_or(rest.len());
            tokens.push(Token::Ident(&rest[..end]));
            i += end;
        }
    }
    Ok(tokens)
}

/// `RW` followed by two digits and an optional L/R/C side.
pub fn is_runway_ident(ident: &str) -> bool {
    let Some(rest) = ident.strip_prefix("RW") else {
        return false;
    };
    let bytes = rest.as_bytes();
    match bytes.len() {
        2 => bytes.iter().all(u8::is_ascii_digit),
        3 => bytes[..2].iter().all(u8::is_ascii_digit) && matches!(bytes[2], b'L' | b'R' | b'C'),
        _ => false,
    }
}

/// Split and resolve a route string against the nav-data context.
pub fn parse_route(route: &str, navdata: &NavDatabase) -> Result<ParsedRoute, RouteError> {
    let tokens = tokenize(route)?;
    if tokens.is_empty() {
        return Err(RouteError::Empty);
    }
    let (Some(Token::Ident(origin)), Some(Token::Ident(destination))) =
        (tokens.first(), tokens.last())
    else {
        return Err(RouteError::MissingEndpoint);
    };
    if tokens.len() < 2 {
        return Err(RouteError::MissingEndpoint);
    }
    let origin = navdata
        .airport(origin)
        .ok_or_else(|| RouteError::UnknownAirport(origin.to_string()))?;
    let destination = navdata
        .airport(destination)
        .ok_or_else(|| RouteError::UnknownAirport(destination.to_string()))?;

    let mut parsed = ParsedRoute {
        origin: origin.code.clone(),
        destination: destination.code.clone(),
        departing_taxi_plan: None,
        landing_taxi_plan: None,
        departing_runway: None,
        landing_runway: None,
        airborne_start: false,
        points: Vec::new(),
    };

    for token in &tokens[1..tokens.len() - 1] {
        let airborne_seen = !parsed.points.is_empty();
        match *token {
            Token::AirborneStart => parsed.airborne_start = true,
            Token::Bracket("") => {}
            Token::Bracket(plan) => {
                if !airborne_seen && !parsed.airborne_start && parsed.departing_taxi_plan.is_none()
                {
                    parsed.departing_taxi_plan = Some(plan.to_string());
                } else if parsed.landing_taxi_plan.is_none() {
                    parsed.landing_taxi_plan = Some(plan.to_string());
                } else {
                    return Err(RouteError::ExtraTaxiPlan);
                }
            }
            Token::Ident(ident) => {
                let ident = ident.to_ascii_uppercase();
                if is_runway_ident(&ident) {
                    if airborne_seen {
                        parsed.landing_runway = Some(ident);
                    } else {
                        parsed.departing_runway = Some(ident);
                    }
                } else if navdata.has_procedure(&ident) {
                    let procedure = [&origin.code, &destination.code]
                        .into_iter()
                        .find_map(|apt| navdata.procedure(&ident, apt))
                        .ok_or_else(|| RouteError::UnknownElement(ident.clone()))?;
                    let airport = if procedure.kind == ProcedureType::Sid {
                        origin
                    } else {
                        destination
                    };
                    expand_procedure(procedure, airport, navdata, &mut parsed.points)?;
                } else if let Some(fix) = navdata.fix(&ident) {
                    parsed
                        .points
                        .push(RoutePoint::enroute(&fix.name, fix.lat_deg, fix.lon_deg));
                } else {
                    return Err(RouteError::UnknownElement(ident));
                }
            }
        }
    }

    debug!(
        origin = %parsed.origin,
        destination = %parsed.destination,
        points = parsed.points.len(),
        "parsed route"
    );
    Ok(parsed)
}

fn expand_procedure(
    procedure: &Procedure,
    airport: &Airport,
    navdata: &NavDatabase,
    points: &mut Vec<RoutePoint>,
) -> Result<(), RouteError> {
    for (i, leg) in procedure.legs.iter().enumerate() {
        let point = match leg.waypoint.as_deref() {
            Some(ident) => {
                let (lat, lon, alt) = if let Some(rw) = airport.runway(ident) {
                    (rw.lat_deg, rw.lon_deg, Some(airport.elevation_ft))
                } else if let Some(fix) = navdata.fix(ident) {
                    (fix.lat_deg, fix.lon_deg, None)
                } else {
                    return Err(RouteError::UnknownProcedureFix {
                        procedure: procedure.name.clone(),
                        fix: ident.to_string(),
                    });
                };
                let mut p = leg_point(ident.to_string(), lat, lon, leg, procedure, airport);
                p.alt_ft = alt;
                p
            }
            None => {
                let (lat, lon) = points
                    .last()
                    .map_or((airport.lat_deg, airport.lon_deg), |p| (p.lat_deg, p.lon_deg));
                let name = format!("{}_{:?}_{}", procedure.name, leg.path_terminator, i);
                let mut p = leg_point(name, lat, lon, leg, procedure, airport);
                p.floating = true;
                p
            }
        };
        points.push(point);
    }
    Ok(())
}

fn leg_point(
    name: String,
    lat_deg: f64,
    lon_deg: f64,
    leg: &Leg,
    procedure: &Procedure,
    airport: &Airport,
) -> RoutePoint {
    RoutePoint {
        alt_desc: leg.alt_desc,
        alt_1_ft: leg.alt_1_ft,
        alt_2_ft: leg.alt_2_ft,
        speed_limit_knots: leg.speed_limit_knots,
        speed_desc: leg.speed_desc,
        procedure_name: procedure.name.clone(),
        proctype: procedure.kind,
        path_terminator: Some(leg.path_terminator),
        recommended_navaid: leg.navaid.clone(),
        course_true_deg: leg.magnetic_course_deg.map(|c| airport.to_true(c)),
        theta_true_deg: leg.theta_deg.map(|t| airport.to_true(t)),
        rho_nm: leg.rho_nm,
        distance_nm: leg.distance_nm,
        ..RoutePoint::enroute(&name, lat_deg, lon_deg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navdata::fixtures;
    use crate::types::PathTerminator;

    const FULL: &str = "KSFO.<{\"id\":\"Gate_A5\"},{\"id\":\"Txy_A_01\"},{\"id\":\"Rwy_01R_001\"}>.RW01R.PORTE3.BSR.SADDE6.I24R.RW24R.<{\"id\":\"Rwy_24R_001\"},{\"id\":\"Gate_32\"}>.KLAX";

    #[test]
    fn tokenizer_keeps_bracket_contents_intact() {
        let tokens = tokenize("KSFO.<{\"lat\":\"37.6\"}>.BSR.KLAX").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("KSFO"),
                Token::Bracket("{\"lat\":\"37.6\"}"),
                Token::Ident("BSR"),
                Token::Ident("KLAX"),
            ]
        );
        assert_eq!(tokenize("KSFO.<{").unwrap_err(), RouteError::UnbalancedBracket);
    }

    #[test]
    fn recognizes_runway_idents() {
        assert!(is_runway_ident("RW01R"));
        assert!(is_runway_ident("RW27"));
        assert!(!is_runway_ident("RWX1"));
        assert!(!is_runway_ident("RZS"));
    }

    #[test]
    fn parses_full_gate_to_gate_route() {
        let db = fixtures::navdata();
        let parsed = parse_route(FULL, &db).unwrap();
        assert_eq!(parsed.origin, "KSFO");
        assert_eq!(parsed.destination, "KLAX");
        assert_eq!(parsed.departing_runway.as_deref(), Some("RW01R"));
        assert_eq!(parsed.landing_runway.as_deref(), Some("RW24R"));
        assert!(parsed.departing_taxi_plan.unwrap().contains("Gate_A5"));
        assert!(parsed.landing_taxi_plan.unwrap().contains("Gate_32"));
        assert!(!parsed.airborne_start);

        let names: Vec<&str> = parsed.points.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names[0], "RW01R");
        assert!(parsed.points[1].floating);
        assert_eq!(parsed.points[1].path_terminator, Some(PathTerminator::VI));
        assert_eq!(&names[2..], ["PORTE", "BSR", "SADDE", "ROMEN", "ROMEN", "RW24R"]);
        assert_eq!(parsed.points[3].proctype, ProcedureType::Enroute);
        // 257 magnetic + 13 east = 270 true.
        assert_eq!(parsed.points[1].course_true_deg, Some(270.0));
    }

    #[test]
    fn airborne_start_has_no_departing_surface() {
        let db = fixtures::navdata();
        let parsed = parse_route("KSFO./.RZS.SADDE6.I24R.KLAX", &db).unwrap();
        assert!(parsed.airborne_start);
        assert!(parsed.departing_taxi_plan.is_none());
        assert_eq!(parsed.points[0].name, "RZS");
    }

    #[test]
    fn unknown_elements_are_rejected() {
        let db = fixtures::navdata();
        assert_eq!(
            parse_route("KSFO.NOWHERE.KLAX", &db).unwrap_err(),
            RouteError::UnknownElement("NOWHERE".into())
        );
        assert_eq!(
            parse_route("KXXX.BSR.KLAX", &db).unwrap_err(),
            RouteError::UnknownAirport("KXXX".into())
        );
        assert_eq!(
            parse_route("KSFO.BSR.<x>", &db).unwrap_err(),
            RouteError::MissingEndpoint
        );
    }
}
