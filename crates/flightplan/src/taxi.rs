//! Surface taxi plans.
//!
//! A plan is a comma-separated list of JSON objects. Id-style tokens name airport-layout
//! nodes (`{"id":"Txy_A_01"}`) and may override the node position with
//! `"latitude"`/`"longitude"`. Geo-style tokens give a node type and coordinates
//! (`{"type":"Ramp","lat":"37.61","lon":"-122.38"}`).

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::navdata::Airport;

#[derive(Debug, Error, PartialEq)]
pub enum TaxiPlanError {
    #[error("taxi plan token must start with '{{'")]
    MissingOpenBrace,
    #[error("taxi plan token is missing its closing '}}'")]
    MissingCloseBrace,
    #[error("unexpected text between taxi plan tokens: {0}")]
    UnexpectedText(String),
    #[error("invalid taxi plan token {token}: {reason}")]
    InvalidToken { token: String, reason: String },
    #[error("taxi node {node} is not part of the {airport} layout")]
    UnknownNode { node: String, airport: String },
    #[error("taxi plan needs at least 2 waypoints, found {0}")]
    TooFewWaypoints(usize),
    #[error("taxi plan runway node {node} does not match runway {runway}")]
    RunwayMismatch { node: String, runway: String },
}

/// Which end of the flight a taxi plan serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxiSide {
    /// Gate to runway; the last node is the runway side.
    Departing,
    /// Runway to gate; the first node is the runway side.
    Landing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaxiWaypoint {
    pub id: String,
    pub lat_deg: f64,
    pub lon_deg: f64,
}

#[derive(Debug, Deserialize)]
struct RawToken {
    id: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    latitude: Option<Value>,
    longitude: Option<Value>,
    lat: Option<Value>,
    lon: Option<Value>,
}

/// Accept coordinates written either as JSON numbers or numeric strings.
fn coordinate(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn split_tokens(text: &str) -> Result<Vec<&str>, TaxiPlanError> {
    let mut tokens = Vec::new();
    let mut rest = text.trim();
    while !rest.is_empty() {
        if !rest.starts_with('{') {
            return Err(if tokens.is_empty() {
                TaxiPlanError::MissingOpenBrace
            } else {
                TaxiPlanError::UnexpectedText(rest.to_string())
            });
        }
        let close = rest.find('}').ok_or(TaxiPlanError::MissingCloseBrace)?;
        // A second '{' before the closing brace means the previous token never closed.
        if rest[1..close].contains('{') {
            return Err(TaxiPlanError::MissingCloseBrace);
        }
        tokens.push(&rest[..=close]);
        rest = rest[close + 1..].trim_start();
        if let Some(after) = rest.strip_prefix(',') {
            rest = after.trim_start();
            if rest.is_empty() {
                return Err(TaxiPlanError::UnexpectedText(",".into()));
            }
        } else if !rest.is_empty() {
            return Err(TaxiPlanError::UnexpectedText(rest.to_string()));
        }
    }
    Ok(tokens)
}

fn resolve_token(token: &str, index: usize, airport: &Airport) -> Result<TaxiWaypoint, TaxiPlanError> {
    let raw: RawToken = serde_json::from_str(token).map_err(|e| TaxiPlanError::InvalidToken {
        token: token.to_string(),
        reason: e.to_string(),
    })?;
    let invalid = |reason: &str| TaxiPlanError::InvalidToken {
        token: token.to_string(),
        reason: reason.to_string(),
    };

    if let Some(id) = raw.id {
        let (lat, lon) = airport
            .layout_node(&id)
            .ok_or_else(|| TaxiPlanError::UnknownNode {
                node: id.clone(),
                airport: airport.code.clone(),
            })?;
        return Ok(TaxiWaypoint {
            lat_deg: coordinate(raw.latitude.as_ref()).unwrap_or(lat),
            lon_deg: coordinate(raw.longitude.as_ref()).unwrap_or(lon),
            id,
        });
    }

    let kind = raw.kind.ok_or_else(|| invalid("token has neither \"id\" nor \"type\""))?;
    let lat_deg = coordinate(raw.lat.as_ref()).ok_or_else(|| invalid("missing or invalid \"lat\""))?;
    let lon_deg = coordinate(raw.lon.as_ref()).ok_or_else(|| invalid("missing or invalid \"lon\""))?;
    Ok(TaxiWaypoint {
        id: format!("{kind}_{index}"),
        lat_deg,
        lon_deg,
    })
}

/// Parse and validate a taxi plan against the airport layout.
///
/// When `runway` is given, a runway-side node whose id starts with `Rwy` must carry the
/// runway designator (`Rwy_01R_001` for `RW01R`).
pub fn parse_taxi_plan(
    text: &str,
    airport: &Airport,
    runway: Option<&str>,
    side: TaxiSide,
) -> Result<Vec<TaxiWaypoint>, TaxiPlanError> {
    let waypoints = split_tokens(text)?
        .into_iter()
        .enumerate()
        .map(|(i, token)| resolve_token(token, i, airport))
        .collect::<Result<Vec<_>, _>>()?;
    if waypoints.len() < 2 {
        return Err(TaxiPlanError::TooFewWaypoints(waypoints.len()));
    }

    let runway_node = match side {
        TaxiSide::Departing => waypoints.last(),
        TaxiSide::Landing => waypoints.first(),
    };
    match (runway, runway_node) {
        (Some(runway), Some(node)) if node.id.starts_with("Rwy") => {
            let designator = runway.trim_start_matches("RW").to_ascii_uppercase();
            if !node.id.to_ascii_uppercase().contains(&designator) {
                return Err(TaxiPlanError::RunwayMismatch {
                    node: node.id.clone(),
                    runway: runway.to_string(),
                });
            }
        }
        (None, _) => warn!(airport = %airport.code, ?side, "taxi plan given without a runway"),
        _ => {}
    }
    Ok(waypoints)
}
