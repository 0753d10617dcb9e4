//! Climb and descent distance integration over the performance table.
//!
//! Distance is `∫ sqrt(V² - Ḣ²) / Ḣ dH`. Whole table rows reuse the precomputed per-row
//! distances; the partial rows at either end are integrated directly in 100 ft pieces so the
//! result is continuous across row boundaries.

use crate::table::{PerformanceTable, Profile, ROW_PIECE_FT};
use crate::AdbError;

/// Simpson's rule over `[a, b]` given the integrand at both ends and the midpoint.
#[inline]
pub fn simpson(a: f64, b: f64, f_a: f64, f_mid: f64, f_b: f64) -> f64 {
    (b - a) / 6.0 * (f_a + 4.0 * f_mid + f_b)
}

/// Composite Simpson integration of the slope ratio from `lo` to `hi`.
pub(crate) fn integrate(
    table: &PerformanceTable,
    profile: Profile,
    lo: f64,
    hi: f64,
    piece_ft: f64,
) -> Result<f64, AdbError> {
    if hi <= lo {
        return Ok(0.0);
    }
    let n = ((hi - lo) / piece_ft).ceil().max(1.0) as usize;
    let dh = (hi - lo) / n as f64;
    let mut total = 0.0;
    for j in 0..n {
        let a = lo + dh * j as f64;
        let b = lo + dh * (j + 1) as f64;
        let mid = 0.5 * (a + b);
        total += simpson(
            a,
            b,
            table.slope_ratio(profile, a)?,
            table.slope_ratio(profile, mid)?,
            table.slope_ratio(profile, b)?,
        );
    }
    Ok(total)
}

/// Horizontal distance (ft) to climb from `start_alt_ft` to `cruise_alt_ft`.
pub fn climb_distance_ft(
    table: &PerformanceTable,
    start_alt_ft: f64,
    cruise_alt_ft: f64,
) -> Result<f64, AdbError> {
    profile_distance(table, Profile::Climb, start_alt_ft, cruise_alt_ft)
}

/// Horizontal distance (ft) to descend from `cruise_alt_ft` to `dest_elevation_ft`.
pub fn descent_distance_ft(
    table: &PerformanceTable,
    dest_elevation_ft: f64,
    cruise_alt_ft: f64,
) -> Result<f64, AdbError> {
    profile_distance(table, Profile::Descent, dest_elevation_ft, cruise_alt_ft)
}

fn profile_distance(
    table: &PerformanceTable,
    profile: Profile,
    low: f64,
    high: f64,
) -> Result<f64, AdbError> {
    if !low.is_finite() || low < 0.0 {
        return Err(AdbError::InvalidAltitude(low));
    }
    if !high.is_finite() || high < 0.0 {
        return Err(AdbError::InvalidAltitude(high));
    }
    if high <= low {
        return Ok(0.0);
    }

    let alts = table.altitudes();
    let n = alts.len();
    let mut k = alts.partition_point(|a| *a < low);
    if k == n || alts[k] >= high {
        return integrate(table, profile, low, high, ROW_PIECE_FT);
    }

    let mut dist = integrate(table, profile, low, alts[k], ROW_PIECE_FT)?;
    while k + 1 < n && alts[k + 1] <= high {
        dist += table.row_distance(profile, k + 1);
        k += 1;
    }
    dist += integrate(table, profile, alts[k], high, ROW_PIECE_FT)?;
    Ok(dist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::sample_config;

    fn table() -> PerformanceTable {
        PerformanceTable::from_config(&sample_config()).expect("table")
    }

    #[test]
    fn simpson_is_exact_for_quadratics() {
        // ∫0..2 x² dx = 8/3
        let v = simpson(0.0, 2.0, 0.0, 1.0, 4.0);
        assert!((v - 8.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn climb_distance_is_zero_for_empty_range() {
        assert_eq!(climb_distance_ft(&table(), 5_000.0, 5_000.0).expect("dist"), 0.0);
        assert_eq!(climb_distance_ft(&table(), 6_000.0, 5_000.0).expect("dist"), 0.0);
    }

    #[test]
    fn whole_rows_match_direct_integration() {
        let t = table();
        let via_rows = climb_distance_ft(&t, 0.0, 20_000.0).expect("rows");
        let direct = integrate(&t, Profile::Climb, 0.0, 10_000.0, ROW_PIECE_FT).expect("a")
            + integrate(&t, Profile::Climb, 10_000.0, 20_000.0, ROW_PIECE_FT).expect("b");
        assert!((via_rows - direct).abs() < 1e-6, "{via_rows} vs {direct}");
    }

    #[test]
    fn climb_distance_grows_with_cruise_altitude() {
        let t = table();
        let mut prev = 0.0;
        for cruise in (1_000..=37_000).step_by(500) {
            let d = climb_distance_ft(&t, 13.0, cruise as f64).expect("dist");
            assert!(d > prev, "distance must increase at {cruise}: {d} <= {prev}");
            prev = d;
        }
    }

    #[test]
    fn descent_distance_is_positive() {
        let d = descent_distance_ft(&table(), 128.0, 33_000.0).expect("dist");
        assert!(d > 0.0);
    }

    #[test]
    fn negative_elevation_is_invalid() {
        assert!(climb_distance_ft(&table(), -10.0, 10_000.0).is_err());
    }
}
