use chrono::NaiveDate;
use thiserror::Error;

/// Malformed input rejected before it can skew a total.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("record {index}: invalid calorie value {value}")]
    InvalidCalories { index: usize, value: f64 },

    #[error("record {index}: date {date} is outside the supported calendar range")]
    DateOutOfRange { index: usize, date: NaiveDate },

    #[error("record {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    #[error("reference date {0} is outside the supported calendar range")]
    ReferenceOutOfRange(NaiveDate),

    #[error("daily calorie goal must be between 800 and 10000, got {0}")]
    InvalidGoal(i64),

    #[error("name must be at most 100 characters, got {0}")]
    NameTooLong(usize),

    #[error("invalid {field} value {value}")]
    InvalidNutrient { field: &'static str, value: f64 },

    #[error("food name is required")]
    EmptyFoodName,

    #[error("search query is required")]
    EmptyQuery,
}
