//! Aircraft performance (ADB/PTF) tables.
//!
//! Tables are immutable once built and shared read-only by every flight of the same type.
//! Lookups interpolate linearly between altitude rows. Climb and descent distances are
//! integrated from the tables with Simpson's rule.

pub mod catalog;
pub mod distance;
pub mod table;

pub use catalog::{AdbCatalog, AdbIndex};
pub use distance::{climb_distance_ft, descent_distance_ft, simpson};
pub use table::{PerformanceTable, Profile};

use thiserror::Error;
use trajsim_config::MassCategoryConfig;

/// Mass category selecting the climb-rate column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum MassCategory {
    Low,
    #[default]
    Nominal,
    High,
}

impl From<MassCategoryConfig> for MassCategory {
    fn from(value: MassCategoryConfig) -> Self {
        match value {
            MassCategoryConfig::Low => Self::Low,
            MassCategoryConfig::Nominal => Self::Nominal,
            MassCategoryConfig::High => Self::High,
        }
    }
}

/// Errors surfaced by performance lookups.
#[derive(Debug, Error, PartialEq)]
pub enum AdbError {
    #[error("aircraft type '{0}' not found in performance catalog")]
    TypeNotFound(String),
    #[error("Altitude value is not valid: {0} ft")]
    InvalidAltitude(f64),
    #[error("performance table {actype} is invalid: {reason}")]
    InvalidTable { actype: String, reason: String },
}
