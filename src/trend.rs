use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::stats;

/// Below three distinct dates no line is fitted and the trend is "stable".
const MIN_DATES_FOR_FIT: usize = 3;
/// Slope magnitude below this is reported as "stable".
const SLOPE_THRESHOLD: f64 = 0.05;

/// Ordinary least-squares slope of `series` against its index 0, 1, 2, ...
pub fn ols_slope(series: &[f64]) -> f64 {
    if series.len() < 2 {
        return 0.0;
    }
    let n = series.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = stats::mean(series);

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, y) in series.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }
    numerator / denominator
}

/// Mood codes grow as mood worsens, so a rising line means decline.
pub fn classify(slope: f64) -> &'static str {
    if slope > SLOPE_THRESHOLD {
        "worsening"
    } else if slope < -SLOPE_THRESHOLD {
        "improving"
    } else {
        "stable"
    }
}

/// Fit daily averages (in chronological order) against their rank index.
/// Returns (slope, direction); without enough dates the slope stays 0.
pub fn analyze(daily_means: &BTreeMap<NaiveDate, f64>) -> (f64, &'static str) {
    if daily_means.len() < MIN_DATES_FOR_FIT {
        return (0.0, "stable");
    }
    let series: Vec<f64> = daily_means.values().copied().collect();
    let slope = ols_slope(&series);
    (slope, classify(slope))
}
