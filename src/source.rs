use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{MealRecord, TrendPoint};
use crate::trend::{compute_trend, window_bounds};

/// Anything that can list a user's meal records for an inclusive date range.
#[async_trait]
pub trait MealSource: Send + Sync {
    async fn meals_between(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MealRecord>>;
}

/// Fetches the window ending at `reference` from `source` and aggregates it.
pub async fn fetch_trend<S>(
    source: &S,
    user_id: &str,
    reference: NaiveDate,
) -> Result<Vec<TrendPoint>>
where
    S: MealSource + ?Sized,
{
    let (start, end) = window_bounds(reference)?;
    let records = source.meals_between(user_id, start, end).await?;
    Ok(compute_trend(&records, user_id, reference)?)
}

/// Records held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMeals {
    records: Vec<MealRecord>,
}

impl InMemoryMeals {
    pub fn new(records: Vec<MealRecord>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: MealRecord) {
        self.records.push(record);
    }
}

#[async_trait]
impl MealSource for InMemoryMeals {
    async fn meals_between(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MealRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.user_id == user_id && r.date >= start && r.date <= end)
            .cloned()
            .collect())
    }
}
