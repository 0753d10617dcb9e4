use trajsim_config::AdbTableConfig;
use trajsim_core::constants::KNOTS_TO_FEET_PER_MIN;

use crate::distance::integrate;
use crate::{AdbError, MassCategory};

/// Width (ft) of the Simpson pieces used for per-row distance tables.
pub(crate) const ROW_PIECE_FT: f64 = 100.0;

/// Vertical profile selecting the climb or descent columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Climb,
    Descent,
}

/// Performance table for one aircraft type.
#[derive(Debug, Clone)]
pub struct PerformanceTable {
    actype: String,
    max_altitude_ft: f64,
    altitudes: Vec<f64>,
    cruise_tas: Vec<f64>,
    climb_tas: Vec<f64>,
    climb_rate_low: Vec<f64>,
    climb_rate_nominal: Vec<f64>,
    climb_rate_high: Vec<f64>,
    descent_tas: Vec<f64>,
    descent_rate: Vec<f64>,
    // Horizontal distance (ft) flown between row i-1 and row i; entry 0 is zero.
    climb_dist_row: Vec<f64>,
    descent_dist_row: Vec<f64>,
    climb_dist_cumulative: Vec<f64>,
    descent_dist_cumulative: Vec<f64>,
}

impl PerformanceTable {
    /// Build a table from its configuration and precompute the distance columns.
    pub fn from_config(config: &AdbTableConfig) -> Result<Self, AdbError> {
        let invalid = |reason: String| AdbError::InvalidTable {
            actype: config.actype.clone(),
            reason,
        };
        if config.rows.is_empty() {
            return Err(invalid("no rows".into()));
        }
        let mut rows = config.rows.clone();
        rows.sort_by(|a, b| a.altitude_ft.total_cmp(&b.altitude_ft));
        for pair in rows.windows(2) {
            if pair[0].altitude_ft == pair[1].altitude_ft {
                return Err(invalid(format!("duplicate altitude {}", pair[0].altitude_ft)));
            }
        }
        for row in &rows {
            if row.altitude_ft < 0.0 {
                return Err(invalid(format!("negative altitude {}", row.altitude_ft)));
            }
            let rates = [
                row.climb_rate_low_fpm,
                row.climb_rate_nominal_fpm,
                row.climb_rate_high_fpm,
                row.descent_rate_nominal_fpm,
            ];
            if rates.iter().any(|r| *r <= 0.0) {
                return Err(invalid(format!("non-positive rate at {} ft", row.altitude_ft)));
            }
            let slowest = row.climb_tas_knots.min(row.descent_tas_knots) * KNOTS_TO_FEET_PER_MIN;
            if rates.iter().any(|r| *r >= slowest) {
                return Err(invalid(format!(
                    "vertical rate exceeds airspeed at {} ft",
                    row.altitude_ft
                )));
            }
        }

        let column = |f: fn(&trajsim_config::AdbRowConfig) -> f64| -> Vec<f64> {
            rows.iter().map(f).collect()
        };
        let mut table = Self {
            actype: config.actype.trim().to_ascii_uppercase(),
            max_altitude_ft: config.max_altitude_ft,
            altitudes: column(|r| r.altitude_ft),
            cruise_tas: column(|r| r.cruise_tas_knots),
            climb_tas: column(|r| r.climb_tas_knots),
            climb_rate_low: column(|r| r.climb_rate_low_fpm),
            climb_rate_nominal: column(|r| r.climb_rate_nominal_fpm),
            climb_rate_high: column(|r| r.climb_rate_high_fpm),
            descent_tas: column(|r| r.descent_tas_knots),
            descent_rate: column(|r| r.descent_rate_nominal_fpm),
            climb_dist_row: Vec::new(),
            descent_dist_row: Vec::new(),
            climb_dist_cumulative: Vec::new(),
            descent_dist_cumulative: Vec::new(),
        };
        table.climb_dist_row = table.row_distances(Profile::Climb)?;
        table.descent_dist_row = table.row_distances(Profile::Descent)?;
        table.climb_dist_cumulative = cumulative(&table.climb_dist_row);
        table.descent_dist_cumulative = cumulative(&table.descent_dist_row);
        Ok(table)
    }

    pub fn actype(&self) -> &str {
        &self.actype
    }

    pub fn max_altitude_ft(&self) -> f64 {
        self.max_altitude_ft
    }

    /// Altitude column in ascending order.
    pub fn altitudes(&self) -> &[f64] {
        &self.altitudes
    }

    pub fn cruise_tas(&self, alt_ft: f64) -> Result<f64, AdbError> {
        self.lookup(alt_ft, &self.cruise_tas)
    }

    pub fn climb_tas(&self, alt_ft: f64) -> Result<f64, AdbError> {
        self.lookup(alt_ft, &self.climb_tas)
    }

    /// Climb rate (ft/min) for the given mass category.
    pub fn climb_rate(&self, alt_ft: f64, mass: MassCategory) -> Result<f64, AdbError> {
        let column = match mass {
            MassCategory::Low => &self.climb_rate_low,
            MassCategory::Nominal => &self.climb_rate_nominal,
            MassCategory::High => &self.climb_rate_high,
        };
        self.lookup(alt_ft, column)
    }

    pub fn descent_tas(&self, alt_ft: f64) -> Result<f64, AdbError> {
        self.lookup(alt_ft, &self.descent_tas)
    }

    /// Descent rate (ft/min). Tables carry a single nominal-mass column.
    pub fn descent_rate(&self, alt_ft: f64) -> Result<f64, AdbError> {
        self.lookup(alt_ft, &self.descent_rate)
    }

    /// Horizontal distance (ft) flown between row `row - 1` and `row`.
    pub fn row_distance(&self, profile: Profile, row: usize) -> f64 {
        match profile {
            Profile::Climb => self.climb_dist_row[row],
            Profile::Descent => self.descent_dist_row[row],
        }
    }

    /// Cumulative horizontal distance (ft) from the first row up to `row`.
    pub fn cumulative_distance(&self, profile: Profile, row: usize) -> f64 {
        match profile {
            Profile::Climb => self.climb_dist_cumulative[row],
            Profile::Descent => self.descent_dist_cumulative[row],
        }
    }

    /// Horizontal feet flown per vertical foot at `alt_ft`, using nominal mass.
    pub fn slope_ratio(&self, profile: Profile, alt_ft: f64) -> Result<f64, AdbError> {
        let (tas, rate) = match profile {
            Profile::Climb => (
                self.climb_tas(alt_ft)?,
                self.climb_rate(alt_ft, MassCategory::Nominal)?,
            ),
            Profile::Descent => (
                self.descent_tas(alt_ft)?,
                self.descent_rate(alt_ft)?,
            ),
        };
        let v = tas * KNOTS_TO_FEET_PER_MIN;
        Ok((v * v - rate * rate).sqrt() / rate)
    }

    fn row_distances(&self, profile: Profile) -> Result<Vec<f64>, AdbError> {
        let mut out = Vec::with_capacity(self.altitudes.len());
        out.push(0.0);
        for pair in self.altitudes.windows(2) {
            out.push(integrate(self, profile, pair[0], pair[1], ROW_PIECE_FT)?);
        }
        Ok(out)
    }

    fn lookup(&self, alt_ft: f64, column: &[f64]) -> Result<f64, AdbError> {
        if !alt_ft.is_finite() || alt_ft < 0.0 {
            return Err(AdbError::InvalidAltitude(alt_ft));
        }
        let alt = alt_ft.min(self.max_altitude_ft);
        let n = self.altitudes.len();
        let upper = self.altitudes.partition_point(|a| *a < alt);
        if upper < n && self.altitudes[upper] == alt {
            return Ok(column[upper]);
        }
        if upper == 0 {
            return Ok(column[0]);
        }
        if upper == n {
            return Ok(column[n - 1]);
        }
        let lower = upper - 1;
        let (x_lo, x_hi) = (self.altitudes[lower], self.altitudes[upper]);
        let (y_lo, y_hi) = (column[lower], column[upper]);
        Ok(y_lo + (alt - x_lo) * (y_hi - y_lo) / (x_hi - x_lo))
    }
}

fn cumulative(rows: &[f64]) -> Vec<f64> {
    rows.iter()
        .scan(0.0, |acc, d| {
            *acc += d;
            Some(*acc)
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use trajsim_config::AdbRowConfig;

    pub(crate) fn sample_config() -> AdbTableConfig {
        let row = |alt: f64, cruise: f64, climb: f64, roc: f64, rod: f64| AdbRowConfig {
            altitude_ft: alt,
            cruise_tas_knots: cruise,
            climb_tas_knots: climb,
            climb_rate_low_fpm: roc * 1.2,
            climb_rate_nominal_fpm: roc,
            climb_rate_high_fpm: roc * 0.8,
            descent_tas_knots: climb,
            descent_rate_nominal_fpm: rod,
        };
        AdbTableConfig {
            actype: "b733".into(),
            max_altitude_ft: 37_000.0,
            mass_kg: None,
            rows: vec![
                row(10_000.0, 300.0, 290.0, 2_000.0, 2_500.0),
                row(0.0, 200.0, 160.0, 3_000.0, 1_000.0),
                row(20_000.0, 400.0, 350.0, 1_500.0, 3_000.0),
                row(37_000.0, 450.0, 420.0, 500.0, 2_500.0),
            ],
        }
    }

    #[test]
    fn interpolates_between_rows() {
        let t = PerformanceTable::from_config(&sample_config()).expect("table");
        assert_eq!(t.actype(), "B733");
        let tas = t.cruise_tas(5_000.0).expect("tas");
        assert!((tas - 250.0).abs() < 1e-9, "tas {tas}");
        assert_eq!(t.cruise_tas(20_000.0).expect("row"), 400.0);
    }

    #[test]
    fn clamps_above_max_altitude() {
        let t = PerformanceTable::from_config(&sample_config()).expect("table");
        assert_eq!(t.cruise_tas(45_000.0).expect("tas"), 450.0);
    }

    #[test]
    fn rejects_negative_altitude() {
        let t = PerformanceTable::from_config(&sample_config()).expect("table");
        let err = t.cruise_tas(-5.0).expect_err("negative altitude");
        assert!(err.to_string().contains("Altitude value is not valid"));
    }

    #[test]
    fn mass_category_selects_climb_column() {
        let t = PerformanceTable::from_config(&sample_config()).expect("table");
        let low = t.climb_rate(0.0, MassCategory::Low).expect("low");
        let high = t.climb_rate(0.0, MassCategory::High).expect("high");
        assert!(low > high);
        assert_eq!(t.climb_rate(0.0, MassCategory::default()), t.climb_rate(0.0, MassCategory::Nominal));
    }

    #[test]
    fn cumulative_distance_sums_rows() {
        let t = PerformanceTable::from_config(&sample_config()).expect("table");
        let sum: f64 = (0..4).map(|i| t.row_distance(Profile::Climb, i)).sum();
        assert!((t.cumulative_distance(Profile::Climb, 3) - sum).abs() < 1e-6);
        assert_eq!(t.row_distance(Profile::Climb, 0), 0.0);
    }

    #[test]
    fn rejects_rate_faster_than_airspeed() {
        let mut cfg = sample_config();
        cfg.rows[0].climb_rate_nominal_fpm = 1.0e6;
        assert!(matches!(
            PerformanceTable::from_config(&cfg),
            Err(AdbError::InvalidTable { .. })
        ));
    }
}
