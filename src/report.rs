use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{seeded_counts, MoodBucket, MoodRecord, StatsFilter};
use crate::{risk, stats, trend};

#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum StatsOutcome {
    Empty(EmptyReport),
    Report(Box<MoodReport>),
}

/// Non-fatal empty result. Callers tell the four cases apart by `message`
/// and tell any of them apart from a full report by its presence.
#[derive(Debug, Serialize, PartialEq)]
pub struct EmptyReport {
    pub total_records: usize,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_count: Option<usize>,
}

impl EmptyReport {
    pub fn no_filter() -> Self {
        Self {
            total_records: 0,
            message: "No filter criteria provided".to_string(),
            employee_count: None,
        }
    }

    pub fn no_employees() -> Self {
        Self {
            total_records: 0,
            message: "No employees found".to_string(),
            employee_count: None,
        }
    }

    pub fn no_mood_data(employee_count: usize) -> Self {
        Self {
            total_records: 0,
            message: "No mood data found".to_string(),
            employee_count: Some(employee_count),
        }
    }

    pub fn no_valid_values(total_records: usize) -> Self {
        Self {
            total_records,
            message: "No valid mood data".to_string(),
            employee_count: None,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MoodReport {
    pub summary: Summary,
    pub mood_distribution: MoodDistribution,
    pub statistics: Statistics,
    pub trend: Trend,
    pub outliers: Outliers,
    pub date_wise: Vec<DateStats>,
    pub employee_wise: Vec<EmployeeStats>,
    pub risk_analysis: RiskAnalysis,
    pub filter: FilterEcho,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Summary {
    pub total_records: usize,
    pub total_employees: usize,
    pub employees_participated: usize,
    pub employees_not_participated: usize,
    pub participation_rate: f64,
    pub date_range: DateRange,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MoodDistribution {
    pub counts: BTreeMap<String, u64>,
    pub percentages: MoodPercentages,
    pub labels: MoodLabels,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MoodPercentages {
    pub mood_1: f64,
    pub mood_2: f64,
    pub mood_3: f64,
    pub mood_4: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MoodLabels {
    #[serde(rename = "1")]
    pub great: &'static str,
    #[serde(rename = "2")]
    pub good: &'static str,
    #[serde(rename = "3")]
    pub okay: &'static str,
    #[serde(rename = "4")]
    pub not_so_good: &'static str,
}

impl Default for MoodLabels {
    fn default() -> Self {
        Self {
            great: "Great",
            good: "Good",
            okay: "Okay",
            not_so_good: "Not so good",
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Statistics {
    pub mean: f64,
    pub median: f64,
    pub mode: i64,
    pub std_deviation: f64,
    pub variance: f64,
    pub min: i64,
    pub max: i64,
    pub range: i64,
    pub quartiles: Quartiles,
    pub iqr: f64,
    pub percentiles: PercentilePoints,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Quartiles {
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct PercentilePoints {
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Trend {
    pub direction: String,
    pub slope: f64,
    pub daily_averages: BTreeMap<NaiveDate, f64>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Outliers {
    pub count: usize,
    pub values: Vec<i64>,
    pub bounds: OutlierBounds,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct OutlierBounds {
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct DateStats {
    pub date: NaiveDate,
    pub average_mood: f64,
    pub total_responses: usize,
    pub mood_counts: BTreeMap<String, u64>,
    pub mood_1_pct: f64,
    pub mood_2_pct: f64,
    pub mood_3_pct: f64,
    pub mood_4_pct: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct EmployeeStats {
    pub employee_id: Uuid,
    pub total_checks: usize,
    pub average_mood: f64,
    pub mood_counts: BTreeMap<String, u64>,
    pub is_at_risk: bool,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct RiskAnalysis {
    pub employees_at_risk_count: usize,
    pub employees_at_risk_ids: Vec<Uuid>,
    pub risk_percentage: f64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct FilterEcho {
    pub company_ids: Option<Vec<Uuid>>,
    pub group_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl FilterEcho {
    /// Echo of the filter as resolved: when the group filter took
    /// precedence, the company set played no part and is not reported.
    fn resolved(filter: &StatsFilter) -> Self {
        let company_ids = if filter.group_id.is_some() {
            None
        } else {
            filter.company_ids.clone()
        };
        Self {
            company_ids,
            group_id: filter.group_id,
            start_date: filter.start_date,
            end_date: filter.end_date,
        }
    }
}

struct Aggregates {
    mood_counts: BTreeMap<String, u64>,
    date_buckets: BTreeMap<NaiveDate, MoodBucket>,
    employee_buckets: BTreeMap<Uuid, MoodBucket>,
    mood_values: Vec<i64>,
}

/// Single pass over the records building all four aggregate structures.
fn aggregate(records: &[MoodRecord]) -> Aggregates {
    let mut agg = Aggregates {
        mood_counts: seeded_counts(),
        date_buckets: BTreeMap::new(),
        employee_buckets: BTreeMap::new(),
        mood_values: Vec::new(),
    };

    for record in records {
        *agg.mood_counts.entry(record.mood.clone()).or_insert(0) += 1;
        agg.date_buckets.entry(record.date).or_default().observe(record);
        agg.employee_buckets
            .entry(record.employee_id)
            .or_default()
            .observe(record);
        if let Some(value) = record.mood_value() {
            agg.mood_values.push(value);
        }
    }

    agg
}

fn code_count(counts: &BTreeMap<String, u64>, code: &str) -> u64 {
    counts.get(code).copied().unwrap_or(0)
}

/// Assemble the full report, or one of the two data-dependent empty exits.
/// Pure: the caller resolves the population and loads the records.
pub fn build_report(
    filter: &StatsFilter,
    total_employees: usize,
    records: &[MoodRecord],
) -> StatsOutcome {
    if records.is_empty() {
        return StatsOutcome::Empty(EmptyReport::no_mood_data(total_employees));
    }

    let agg = aggregate(records);
    if agg.mood_values.is_empty() {
        return StatsOutcome::Empty(EmptyReport::no_valid_values(records.len()));
    }

    let values: Vec<f64> = agg.mood_values.iter().map(|&v| v as f64).collect();
    let total_records = records.len();

    let q1 = stats::percentile(&values, 25.0);
    let q2 = stats::percentile(&values, 50.0);
    let q3 = stats::percentile(&values, 75.0);
    let iqr = q3 - q1;
    let (lower_bound, upper_bound) = stats::tukey_bounds(q1, q3);
    let outlier_values: Vec<i64> = agg
        .mood_values
        .iter()
        .copied()
        .filter(|&v| (v as f64) < lower_bound || (v as f64) > upper_bound)
        .collect();

    let min = agg.mood_values.iter().copied().min().unwrap_or(0);
    let max = agg.mood_values.iter().copied().max().unwrap_or(0);

    let statistics = Statistics {
        mean: stats::round_to(stats::mean(&values), 2),
        median: stats::round_to(stats::median(&values), 2),
        mode: stats::mode(&agg.mood_values).unwrap_or(min),
        std_deviation: stats::round_to(stats::sample_std_dev(&values), 4),
        variance: stats::round_to(stats::sample_variance(&values), 4),
        min,
        max,
        range: max - min,
        quartiles: Quartiles {
            q1: stats::round_to(q1, 2),
            q2: stats::round_to(q2, 2),
            q3: stats::round_to(q3, 2),
        },
        iqr: stats::round_to(iqr, 2),
        percentiles: PercentilePoints {
            p10: stats::round_to(stats::percentile(&values, 10.0), 2),
            p25: stats::round_to(q1, 2),
            p50: stats::round_to(q2, 2),
            p75: stats::round_to(q3, 2),
            p90: stats::round_to(stats::percentile(&values, 90.0), 2),
        },
        skewness: stats::skewness(&values).map(|v| stats::round_to(v, 4)),
        kurtosis: stats::kurtosis(&values).map(|v| stats::round_to(v, 4)),
    };

    // Daily means stay unrounded for the trend fit; rounding is display-only.
    let mut daily_means: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for (date, bucket) in &agg.date_buckets {
        if bucket.moods.is_empty() {
            continue;
        }
        let day_values: Vec<f64> = bucket.moods.iter().map(|&v| v as f64).collect();
        daily_means.insert(*date, stats::mean(&day_values));
    }
    let (slope, direction) = trend::analyze(&daily_means);
    let trend = Trend {
        direction: direction.to_string(),
        slope: stats::round_to(slope, 4),
        daily_averages: daily_means
            .iter()
            .map(|(date, mean)| (*date, stats::round_to(*mean, 2)))
            .collect(),
    };

    let date_wise: Vec<DateStats> = agg
        .date_buckets
        .iter()
        .filter(|(_, bucket)| !bucket.moods.is_empty())
        .map(|(date, bucket)| {
            let responses = bucket.moods.len();
            let pct = |code: &str| {
                stats::round_to(
                    code_count(&bucket.counts, code) as f64 / responses as f64 * 100.0,
                    1,
                )
            };
            DateStats {
                date: *date,
                average_mood: stats::round_to(daily_means[date], 2),
                total_responses: responses,
                mood_counts: bucket.counts.clone(),
                mood_1_pct: pct("1"),
                mood_2_pct: pct("2"),
                mood_3_pct: pct("3"),
                mood_4_pct: pct("4"),
            }
        })
        .collect();

    let employee_wise = risk::classify_employees(&agg.employee_buckets);
    let participated = agg.employee_buckets.len();
    let risk_analysis = risk::risk_analysis(&employee_wise, participated);

    let participation_rate = if total_employees == 0 {
        0.0
    } else {
        stats::round_to(participated as f64 / total_employees as f64 * 100.0, 2)
    };

    let summary = Summary {
        total_records,
        total_employees,
        employees_participated: participated,
        employees_not_participated: total_employees.saturating_sub(participated),
        participation_rate,
        date_range: DateRange {
            start: records.iter().map(|r| r.date).min(),
            end: records.iter().map(|r| r.date).max(),
        },
    };

    let distribution_pct = |code: &str| {
        stats::round_to(
            code_count(&agg.mood_counts, code) as f64 / total_records as f64 * 100.0,
            2,
        )
    };
    let mood_distribution = MoodDistribution {
        counts: agg.mood_counts.clone(),
        percentages: MoodPercentages {
            mood_1: distribution_pct("1"),
            mood_2: distribution_pct("2"),
            mood_3: distribution_pct("3"),
            mood_4: distribution_pct("4"),
        },
        labels: MoodLabels::default(),
    };

    let outliers = Outliers {
        count: outlier_values.len(),
        values: outlier_values,
        bounds: OutlierBounds {
            lower: stats::round_to(lower_bound, 2),
            upper: stats::round_to(upper_bound, 2),
        },
    };

    StatsOutcome::Report(Box::new(MoodReport {
        summary,
        mood_distribution,
        statistics,
        trend,
        outliers,
        date_wise,
        employee_wise,
        risk_analysis,
        filter: FilterEcho::resolved(filter),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eid(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn record(employee: u128, date_day: u32, mood: &str) -> MoodRecord {
        MoodRecord {
            employee_id: eid(employee),
            date: day(date_day),
            mood: mood.to_string(),
        }
    }

    fn unwrap_report(outcome: StatsOutcome) -> MoodReport {
        match outcome {
            StatsOutcome::Report(report) => *report,
            StatsOutcome::Empty(empty) => panic!("expected full report, got {empty:?}"),
        }
    }

    fn mixed_scenario() -> Vec<MoodRecord> {
        vec![
            record(1, 1, "1"),
            record(1, 2, "1"),
            record(2, 1, "4"),
        ]
    }

    #[test]
    fn mixed_scenario_counts_and_means() {
        let report = unwrap_report(build_report(&StatsFilter::default(), 2, &mixed_scenario()));

        assert_eq!(report.mood_distribution.counts["1"], 2);
        assert_eq!(report.mood_distribution.counts["2"], 0);
        assert_eq!(report.mood_distribution.counts["3"], 0);
        assert_eq!(report.mood_distribution.counts["4"], 1);
        assert_eq!(report.statistics.mean, 2.0);
        assert_eq!(report.statistics.median, 1.0);
        assert_eq!(report.statistics.mode, 1);
        assert_eq!(report.statistics.min, 1);
        assert_eq!(report.statistics.max, 4);
        assert_eq!(report.statistics.range, 3);
        assert_eq!(report.mood_distribution.percentages.mood_1, 66.67);
        assert_eq!(report.mood_distribution.percentages.mood_4, 33.33);
    }

    #[test]
    fn mixed_scenario_risk_classification() {
        let report = unwrap_report(build_report(&StatsFilter::default(), 2, &mixed_scenario()));

        let e1 = report
            .employee_wise
            .iter()
            .find(|row| row.employee_id == eid(1))
            .unwrap();
        assert_eq!(e1.average_mood, 1.0);
        assert!(!e1.is_at_risk);
        assert_eq!(e1.total_checks, 2);

        let e2 = report
            .employee_wise
            .iter()
            .find(|row| row.employee_id == eid(2))
            .unwrap();
        assert_eq!(e2.average_mood, 4.0);
        assert!(e2.is_at_risk);

        assert_eq!(report.risk_analysis.employees_at_risk_count, 1);
        assert_eq!(report.risk_analysis.employees_at_risk_ids, vec![eid(2)]);
        assert_eq!(report.risk_analysis.risk_percentage, 50.0);
    }

    #[test]
    fn mixed_scenario_summary_and_dates() {
        let report = unwrap_report(build_report(&StatsFilter::default(), 2, &mixed_scenario()));

        assert_eq!(report.summary.total_records, 3);
        assert_eq!(report.summary.total_employees, 2);
        assert_eq!(report.summary.employees_participated, 2);
        assert_eq!(report.summary.employees_not_participated, 0);
        assert_eq!(report.summary.participation_rate, 100.0);
        assert_eq!(report.summary.date_range.start, Some(day(1)));
        assert_eq!(report.summary.date_range.end, Some(day(2)));

        assert_eq!(report.date_wise.len(), 2);
        let first = &report.date_wise[0];
        assert_eq!(first.date, day(1));
        assert_eq!(first.average_mood, 2.5);
        assert_eq!(first.total_responses, 2);
        assert_eq!(first.mood_1_pct, 50.0);
        assert_eq!(first.mood_4_pct, 50.0);
        assert_eq!(report.date_wise[1].average_mood, 1.0);

        // Two distinct dates: no fit, even with sharply different averages.
        assert_eq!(report.trend.slope, 0.0);
        assert_eq!(report.trend.direction, "stable");
        assert_eq!(report.trend.daily_averages.len(), 2);
    }

    #[test]
    fn quartiles_are_ordered() {
        let report = unwrap_report(build_report(&StatsFilter::default(), 2, &mixed_scenario()));
        let s = &report.statistics;
        assert!(s.min as f64 <= s.quartiles.q1);
        assert!(s.quartiles.q1 <= s.median);
        assert!(s.median <= s.quartiles.q3);
        assert!(s.quartiles.q3 <= s.max as f64);
        assert!(s.iqr >= 0.0);
        assert_eq!(s.percentiles.p25, s.quartiles.q1);
        assert_eq!(s.percentiles.p75, s.quartiles.q3);
    }

    #[test]
    fn uncoercible_moods_count_toward_totals_only() {
        let mut records = mixed_scenario();
        records.push(record(3, 1, "fine"));
        let report = unwrap_report(build_report(&StatsFilter::default(), 3, &records));

        assert_eq!(report.summary.total_records, 4);
        let count_sum: u64 = report.mood_distribution.counts.values().sum();
        assert_eq!(count_sum, 4);
        assert_eq!(report.mood_distribution.counts["fine"], 1);
        // Numeric aggregates ignore the invalid record.
        assert_eq!(report.statistics.mean, 2.0);
        // ...but the employee still counts as a participant.
        assert_eq!(report.summary.employees_participated, 3);
        assert_eq!(report.employee_wise.len(), 2);
    }

    #[test]
    fn skewness_and_kurtosis_absent_below_three_values() {
        let records = vec![record(1, 1, "1"), record(2, 1, "4")];
        let report = unwrap_report(build_report(&StatsFilter::default(), 2, &records));
        assert_eq!(report.statistics.skewness, None);
        assert_eq!(report.statistics.kurtosis, None);
    }

    #[test]
    fn lone_extreme_value_is_an_outlier() {
        let mut records: Vec<MoodRecord> = (0..7).map(|i| record(i as u128, 1, "1")).collect();
        records.push(record(7, 1, "4"));
        let report = unwrap_report(build_report(&StatsFilter::default(), 8, &records));

        assert_eq!(report.outliers.count, 1);
        assert_eq!(report.outliers.values, vec![4]);
        assert_eq!(report.outliers.bounds.lower, 1.0);
        assert_eq!(report.outliers.bounds.upper, 1.0);
    }

    #[test]
    fn trend_fits_with_three_distinct_dates() {
        let records = vec![
            record(1, 1, "1"),
            record(1, 2, "2"),
            record(1, 3, "3"),
        ];
        let report = unwrap_report(build_report(&StatsFilter::default(), 1, &records));
        assert_eq!(report.trend.slope, 1.0);
        assert_eq!(report.trend.direction, "worsening");
    }

    #[test]
    fn no_records_short_circuits_with_population_size() {
        let outcome = build_report(&StatsFilter::default(), 5, &[]);
        assert_eq!(
            outcome,
            StatsOutcome::Empty(EmptyReport::no_mood_data(5))
        );
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["total_records"], 0);
        assert_eq!(json["message"], "No mood data found");
        assert_eq!(json["employee_count"], 5);
    }

    #[test]
    fn single_uncoercible_record_short_circuits() {
        let records = vec![record(1, 1, "terrible")];
        let outcome = build_report(&StatsFilter::default(), 1, &records);
        assert_eq!(
            outcome,
            StatsOutcome::Empty(EmptyReport::no_valid_values(1))
        );
    }

    #[test]
    fn empty_exits_carry_distinct_messages() {
        assert_eq!(EmptyReport::no_filter().message, "No filter criteria provided");
        assert_eq!(EmptyReport::no_employees().message, "No employees found");
        let json = serde_json::to_value(EmptyReport::no_filter()).unwrap();
        assert!(json.get("employee_count").is_none());
    }

    #[test]
    fn identical_inputs_produce_identical_reports() {
        let filter = StatsFilter {
            start_date: Some(day(1)),
            end_date: Some(day(2)),
            ..Default::default()
        };
        let records = mixed_scenario();
        let first = serde_json::to_string(&build_report(&filter, 2, &records)).unwrap();
        let second = serde_json::to_string(&build_report(&filter, 2, &records)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn narrowing_the_date_range_never_adds_records() {
        let records = mixed_scenario();
        let full = unwrap_report(build_report(&StatsFilter::default(), 2, &records));
        let narrowed: Vec<MoodRecord> = records
            .iter()
            .filter(|r| r.date <= day(1))
            .cloned()
            .collect();
        let narrow = unwrap_report(build_report(&StatsFilter::default(), 2, &narrowed));
        assert!(narrow.summary.total_records <= full.summary.total_records);
    }

    #[test]
    fn group_precedence_blanks_company_echo() {
        let group = Uuid::from_u128(10);
        let filter = StatsFilter {
            company_ids: Some(vec![Uuid::from_u128(20)]),
            group_id: Some(group),
            ..Default::default()
        };
        let report = unwrap_report(build_report(&filter, 2, &mixed_scenario()));
        assert_eq!(report.filter.company_ids, None);
        assert_eq!(report.filter.group_id, Some(group));
    }

    #[test]
    fn report_serializes_contract_fields() {
        let report = build_report(&StatsFilter::default(), 2, &mixed_scenario());
        let json = serde_json::to_value(&report).unwrap();

        assert!(json.get("message").is_none());
        assert_eq!(json["summary"]["total_records"], 3);
        assert_eq!(json["mood_distribution"]["labels"]["1"], "Great");
        assert_eq!(json["mood_distribution"]["labels"]["4"], "Not so good");
        assert_eq!(json["statistics"]["quartiles"]["q1"], 1.0);
        assert_eq!(json["trend"]["direction"], "stable");
        assert_eq!(json["trend"]["daily_averages"]["2026-03-01"], 2.5);
        assert_eq!(json["summary"]["date_range"]["start"], "2026-03-01");
        assert_eq!(json["risk_analysis"]["risk_percentage"], 50.0);
        assert_eq!(json["date_wise"][0]["date"], "2026-03-01");
        assert!(json["filter"]["group_id"].is_null());
    }
}
