//! Seven-day calorie trend.
//!
//! Turns a user's meal records into one total per day for the reference date
//! and the six days before it. Days without meals are reported as zero.

use std::collections::HashMap;

use chrono::{Datelike, Days, NaiveDate};
use tracing::debug;

use crate::error::ValidationError;
use crate::models::{DailyTotal, MealRecord, TrendPoint};

/// Number of days in a trend window, reference date included.
pub const WINDOW_DAYS: u64 = 7;

const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 9999;

/// Produces the display label for a day.
pub trait DayLabeler {
    fn label(&self, date: NaiveDate) -> String;
}

impl<F> DayLabeler for F
where
    F: Fn(NaiveDate) -> String,
{
    fn label(&self, date: NaiveDate) -> String {
        self(date)
    }
}

/// English short weekday names ("Mon", "Tue", ...).
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortWeekday;

impl DayLabeler for ShortWeekday {
    fn label(&self, date: NaiveDate) -> String {
        date.format("%a").to_string()
    }
}

fn in_sane_range(date: NaiveDate) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&date.year())
}

/// Inclusive `(start, end)` of the window ending at `reference`.
pub fn window_bounds(reference: NaiveDate) -> Result<(NaiveDate, NaiveDate), ValidationError> {
    if !in_sane_range(reference) {
        return Err(ValidationError::ReferenceOutOfRange(reference));
    }
    let start = reference
        .checked_sub_days(Days::new(WINDOW_DAYS - 1))
        .filter(|start| in_sane_range(*start))
        .ok_or(ValidationError::ReferenceOutOfRange(reference))?;
    Ok((start, reference))
}

/// Checks a single record; `index` is its position in the caller's slice.
pub fn validate_record(index: usize, record: &MealRecord) -> Result<(), ValidationError> {
    if !record.calories.is_finite() || record.calories < 0.0 {
        return Err(ValidationError::InvalidCalories {
            index,
            value: record.calories,
        });
    }
    if !in_sane_range(record.date) {
        return Err(ValidationError::DateOutOfRange {
            index,
            date: record.date,
        });
    }
    Ok(())
}

/// Per-day totals for the window ending at `reference`, oldest first.
///
/// Records of other users are skipped without inspection. Every record of
/// `user_id` is validated, including ones outside the window.
pub fn daily_totals(
    records: &[MealRecord],
    user_id: &str,
    reference: NaiveDate,
) -> Result<Vec<DailyTotal>, ValidationError> {
    let (start, end) = window_bounds(reference)?;

    let mut by_date: HashMap<NaiveDate, f64> = HashMap::new();
    let mut counted = 0usize;
    for (index, record) in records.iter().enumerate() {
        if record.user_id != user_id {
            continue;
        }
        validate_record(index, record)?;
        if record.date < start || record.date > end {
            continue;
        }
        *by_date.entry(record.date).or_insert(0.0) += record.calories;
        counted += 1;
    }

    debug!(
        user_id,
        %start,
        %end,
        total = records.len(),
        counted,
        "aggregated meal records"
    );

    Ok(start
        .iter_days()
        .take(WINDOW_DAYS as usize)
        .map(|date| DailyTotal {
            date,
            total_calories: by_date.get(&date).copied().unwrap_or(0.0),
        })
        .collect())
}

/// The 7-point trend ending at `reference`, labelled with short weekday names.
pub fn compute_trend(
    records: &[MealRecord],
    user_id: &str,
    reference: NaiveDate,
) -> Result<Vec<TrendPoint>, ValidationError> {
    compute_trend_with(records, user_id, reference, &ShortWeekday)
}

/// Like [`compute_trend`] with a caller-chosen label convention.
pub fn compute_trend_with<L: DayLabeler + ?Sized>(
    records: &[MealRecord],
    user_id: &str,
    reference: NaiveDate,
    labeler: &L,
) -> Result<Vec<TrendPoint>, ValidationError> {
    Ok(daily_totals(records, user_id, reference)?
        .into_iter()
        .map(|day| TrendPoint {
            label: labeler.label(day.date),
            date: day.date,
            calories: day.total_calories,
        })
        .collect())
}
