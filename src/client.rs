use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::auth::SupabaseAuth;
use crate::config::SupabaseConfig;
use crate::error::ValidationError;
use crate::models::*;
use crate::source::{fetch_trend, MealSource};
use crate::supabase::{eq, parse_meal, parse_meals, parse_num, Coercion, SupabaseClient};

const MEALS: &str = "meals";
const PROFILES: &str = "profiles";
const SEARCH_FUNCTION: &str = "search-nutrition";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    foods: Vec<NutritionResult>,
}

#[derive(Clone)]
pub struct CalorieClient {
    pub supabase: SupabaseClient,
    coercion: Coercion,
    user_id: Option<String>,
}

impl CalorieClient {
    pub fn new(config: SupabaseConfig, refresh_token: String) -> Self {
        let auth = SupabaseAuth::new(config, refresh_token);
        Self {
            supabase: SupabaseClient::new(auth),
            coercion: Coercion::default(),
            user_id: None,
        }
    }

    /// Sign in with email and password.
    pub async fn login(config: SupabaseConfig, email: &str, password: &str) -> Result<Self> {
        let auth = SupabaseAuth::sign_in_with_password(config, email, password).await?;
        Ok(Self {
            supabase: SupabaseClient::new(auth),
            coercion: Coercion::default(),
            user_id: None,
        })
    }

    /// Sets how rows with missing or non-numeric calories are read.
    pub fn with_coercion(mut self, coercion: Coercion) -> Self {
        self.coercion = coercion;
        self
    }

    pub async fn get_user_id(&mut self) -> Result<String> {
        if let Some(ref uid) = self.user_id {
            return Ok(uid.clone());
        }
        let uid = self.supabase.auth().get_user_id().await?;
        self.user_id = Some(uid.clone());
        Ok(uid)
    }

    async fn meals_for_user(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Meal>> {
        let rows = self
            .supabase
            .select(
                MEALS,
                &[
                    ("select", "*".to_string()),
                    ("user_id", eq(user_id)),
                    ("meal_date", format!("gte.{}", start.format("%Y-%m-%d"))),
                    ("meal_date", format!("lte.{}", end.format("%Y-%m-%d"))),
                    ("order", "meal_date.asc,created_at.asc".to_string()),
                ],
            )
            .await?;
        Ok(parse_meals(&rows, self.coercion)?)
    }

    /// Get the current user's meals for an inclusive date range.
    pub async fn get_meals(&mut self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Meal>> {
        let uid = self.get_user_id().await?;
        self.meals_for_user(&uid, start, end).await
    }

    /// Like [`Self::get_meals`], reduced to what the trend needs.
    pub async fn get_meal_records(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MealRecord>> {
        let meals = self.get_meals(start, end).await?;
        Ok(meals.iter().map(Meal::record).collect())
    }

    /// The 7-day calorie trend ending at `reference`.
    pub async fn get_trend(&mut self, reference: NaiveDate) -> Result<Vec<TrendPoint>> {
        let uid = self.get_user_id().await?;
        fetch_trend(&*self, &uid, reference).await
    }

    pub async fn get_profile(&mut self) -> Result<Profile> {
        let uid = self.get_user_id().await?;
        let rows = self
            .supabase
            .select(PROFILES, &[("select", "*".to_string()), ("id", eq(&uid))])
            .await?;
        let row = rows
            .first()
            .ok_or_else(|| anyhow!("No profile for user {}", uid))?;
        Ok(parse_profile(row, &uid))
    }

    /// Change the daily goal and display name.
    pub async fn update_profile(&mut self, update: &ProfileUpdate) -> Result<Profile> {
        // Re-check in case the caller built the struct by hand
        let update = ProfileUpdate::new(update.daily_calorie_goal, update.full_name.as_deref())?;
        let uid = self.get_user_id().await?;
        let rows = self
            .supabase
            .update(PROFILES, &[("id", eq(&uid))], &update)
            .await?;
        let row = rows
            .first()
            .ok_or_else(|| anyhow!("No profile for user {}", uid))?;
        Ok(parse_profile(row, &uid))
    }

    /// Totals and goal progress for one day.
    pub async fn daily_summary(&mut self, date: NaiveDate) -> Result<DailySummary> {
        let goal = self.get_profile().await?.effective_goal();
        let meals = self.get_meals(date, date).await?;
        Ok(DailySummary::from_meals(date, &meals, goal)?)
    }

    /// Log a meal for the current user and return the stored row.
    pub async fn log_meal(&mut self, meal: &NewMeal) -> Result<Meal> {
        meal.validate()?;
        let uid = self.get_user_id().await?;

        let mut row = serde_json::to_value(meal)?;
        if let Some(obj) = row.as_object_mut() {
            obj.insert("user_id".to_string(), json!(uid));
        }

        let rows = self.supabase.insert(MEALS, &[row]).await?;
        let stored = rows
            .first()
            .ok_or_else(|| anyhow!("Insert into {} returned no rows", MEALS))?;
        debug!(food = %meal.food_name, calories = meal.calories, "logged meal");
        Ok(parse_meal(stored, 0, self.coercion)?)
    }

    pub async fn delete_meal(&self, meal_id: &str) -> Result<()> {
        self.supabase.delete(MEALS, &[("id", eq(meal_id))]).await
    }

    /// Look up nutrition facts for a free-text query, e.g. "1 cup rice".
    pub async fn search_nutrition(&self, query: &str) -> Result<Vec<NutritionResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ValidationError::EmptyQuery.into());
        }
        let data = self
            .supabase
            .invoke(SEARCH_FUNCTION, &json!({ "query": query }))
            .await?;
        let resp: SearchResponse = serde_json::from_value(data)?;
        Ok(resp.foods)
    }
}

#[async_trait]
impl MealSource for CalorieClient {
    async fn meals_between(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MealRecord>> {
        let meals = self.meals_for_user(user_id, start, end).await?;
        Ok(meals.iter().map(Meal::record).collect())
    }
}

fn parse_profile(row: &Value, uid: &str) -> Profile {
    Profile {
        id: row
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or(uid)
            .to_string(),
        full_name: row
            .get("full_name")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(String::from),
        daily_calorie_goal: parse_num(row.get("daily_calorie_goal")),
    }
}
