pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Percentile with linear interpolation between closest ranks. `p` is in
/// [0, 100]. Returns 0.0 for an empty slice.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (n - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

pub fn median(values: &[f64]) -> f64 {
    percentile(values, 50.0)
}

/// Most frequent value; the smallest one wins a tie.
pub fn mode(values: &[i64]) -> Option<i64> {
    let mut counts: std::collections::BTreeMap<i64, usize> = std::collections::BTreeMap::new();
    for &value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    let mut best: Option<(i64, usize)> = None;
    for (value, count) in counts {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((value, count)),
        }
    }
    best.map(|(value, _)| value)
}

/// Bessel-corrected sample variance. 0.0 by convention when n < 2.
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

pub fn sample_std_dev(values: &[f64]) -> f64 {
    sample_variance(values).sqrt()
}

fn central_moment(values: &[f64], order: i32) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(order)).sum::<f64>() / values.len() as f64
}

/// Biased (population) skewness, defined only for n >= 3. A zero-variance
/// sample yields 0.0 by convention.
pub fn skewness(values: &[f64]) -> Option<f64> {
    if values.len() < 3 {
        return None;
    }
    let m2 = central_moment(values, 2);
    if m2 == 0.0 {
        return Some(0.0);
    }
    Some(central_moment(values, 3) / m2.powf(1.5))
}

/// Excess kurtosis (Fisher), biased estimator, defined only for n >= 3.
pub fn kurtosis(values: &[f64]) -> Option<f64> {
    if values.len() < 3 {
        return None;
    }
    let m2 = central_moment(values, 2);
    if m2 == 0.0 {
        return Some(0.0);
    }
    Some(central_moment(values, 4) / (m2 * m2) - 3.0)
}

/// Tukey fences: (q1 - 1.5*IQR, q3 + 1.5*IQR).
pub fn tukey_bounds(q1: f64, q3: f64) -> (f64, f64) {
    let iqr = q3 - q1;
    (q1 - 1.5 * iqr, q3 + 1.5 * iqr)
}

pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
