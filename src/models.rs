use std::collections::BTreeMap;

use chrono::NaiveDate;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct MoodRecord {
    pub employee_id: Uuid,
    pub date: NaiveDate,
    pub mood: String,
}

impl MoodRecord {
    /// Integer coercion of the stored mood text. Records that fail here
    /// still count toward raw totals but never enter numeric aggregates.
    pub fn mood_value(&self) -> Option<i64> {
        self.mood.trim().parse::<i64>().ok()
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatsFilter {
    pub company_ids: Option<Vec<Uuid>>,
    pub group_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Group(Uuid),
    Companies(Vec<Uuid>),
}

impl StatsFilter {
    /// Selection precedence: group wins over companies; an absent or empty
    /// company set with no group means no selection at all.
    pub fn selection(&self) -> Option<Selection> {
        if let Some(group_id) = self.group_id {
            return Some(Selection::Group(group_id));
        }
        match &self.company_ids {
            Some(ids) if !ids.is_empty() => Some(Selection::Companies(ids.clone())),
            _ => None,
        }
    }
}

/// Per-date or per-employee accumulation: coercible mood values in record
/// order plus a count per raw mood code, seeded with the four known codes.
#[derive(Debug, Clone)]
pub struct MoodBucket {
    pub moods: Vec<i64>,
    pub counts: BTreeMap<String, u64>,
}

impl MoodBucket {
    pub fn new() -> Self {
        Self {
            moods: Vec::new(),
            counts: seeded_counts(),
        }
    }

    pub fn observe(&mut self, record: &MoodRecord) {
        if let Some(value) = record.mood_value() {
            self.moods.push(value);
        }
        *self.counts.entry(record.mood.clone()).or_insert(0) += 1;
    }
}

impl Default for MoodBucket {
    fn default() -> Self {
        Self::new()
    }
}

pub fn seeded_counts() -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for code in ["1", "2", "3", "4"] {
        counts.insert(code.to_string(), 0);
    }
    counts
}
