use std::collections::BTreeMap;

use uuid::Uuid;

use crate::models::MoodBucket;
use crate::report::{EmployeeStats, RiskAnalysis};
use crate::stats;

/// Fixed policy constant: a mean mood of "Okay" or worse flags an employee.
pub const AT_RISK_THRESHOLD: f64 = 3.0;

/// One row per employee with at least one coercible mood value, ordered by
/// employee id.
pub fn classify_employees(employee_buckets: &BTreeMap<Uuid, MoodBucket>) -> Vec<EmployeeStats> {
    let mut rows = Vec::new();

    for (employee_id, bucket) in employee_buckets {
        if bucket.moods.is_empty() {
            continue;
        }
        let values: Vec<f64> = bucket.moods.iter().map(|&v| v as f64).collect();
        let average = stats::mean(&values);
        rows.push(EmployeeStats {
            employee_id: *employee_id,
            total_checks: bucket.moods.len(),
            average_mood: stats::round_to(average, 2),
            mood_counts: bucket.counts.clone(),
            is_at_risk: average >= AT_RISK_THRESHOLD,
        });
    }

    rows
}

/// Aggregate view over the classified rows. The percentage is relative to
/// employees who actually participated, never the full population.
pub fn risk_analysis(rows: &[EmployeeStats], participated: usize) -> RiskAnalysis {
    let at_risk_ids: Vec<Uuid> = rows
        .iter()
        .filter(|row| row.is_at_risk)
        .map(|row| row.employee_id)
        .collect();

    let risk_percentage = if participated == 0 {
        0.0
    } else {
        stats::round_to(at_risk_ids.len() as f64 / participated as f64 * 100.0, 2)
    };

    RiskAnalysis {
        employees_at_risk_count: at_risk_ids.len(),
        employees_at_risk_ids: at_risk_ids,
        risk_percentage,
    }
}
