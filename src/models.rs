use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::trend::validate_record;

/// Goal used when the profile has none set.
pub const DEFAULT_DAILY_GOAL: f64 = 2000.0;
pub const MIN_DAILY_GOAL: i64 = 800;
pub const MAX_DAILY_GOAL: i64 = 10_000;
pub const MAX_NAME_LEN: usize = 100;

/// The minimal view of a logged meal the trend aggregator works on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealRecord {
    pub user_id: String,
    pub date: NaiveDate,
    /// Calories (kcal)
    pub calories: f64,
}

impl MealRecord {
    pub fn new(user_id: impl Into<String>, date: NaiveDate, calories: f64) -> Self {
        Self {
            user_id: user_id.into(),
            date,
            calories,
        }
    }
}

/// Calories summed over one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total_calories: f64,
}

/// One point of the 7-day chart series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Short day name, e.g. "Mon"
    pub label: String,
    pub date: NaiveDate,
    pub calories: f64,
}

/// A row of the `meals` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub id: String,
    pub user_id: String,
    pub food_name: String,
    /// Calories (kcal)
    pub calories: f64,
    /// Protein (g)
    pub protein: f64,
    /// Carbs (g)
    pub carbs: f64,
    /// Fat (g)
    pub fat: f64,
    pub meal_date: NaiveDate,
    pub created_at: Option<DateTime<Utc>>,
}

impl Meal {
    pub fn record(&self) -> MealRecord {
        MealRecord::new(self.user_id.clone(), self.meal_date, self.calories)
    }
}

/// Payload for logging a meal. The owning user is filled in by the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewMeal {
    pub food_name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    /// Defaults to the current date on the server when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_date: Option<NaiveDate>,
}

impl NewMeal {
    pub fn new(food_name: impl Into<String>, calories: f64) -> Self {
        Self {
            food_name: food_name.into(),
            calories,
            ..Default::default()
        }
    }

    pub fn with_macros(mut self, protein: f64, carbs: f64, fat: f64) -> Self {
        self.protein = protein;
        self.carbs = carbs;
        self.fat = fat;
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.meal_date = Some(date);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.food_name.trim().is_empty() {
            return Err(ValidationError::EmptyFoodName);
        }
        for (field, value) in [
            ("calories", self.calories),
            ("protein", self.protein),
            ("carbs", self.carbs),
            ("fat", self.fat),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::InvalidNutrient { field, value });
            }
        }
        Ok(())
    }
}

/// A row of the `profiles` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub full_name: Option<String>,
    pub daily_calorie_goal: Option<f64>,
}

impl Profile {
    pub fn effective_goal(&self) -> f64 {
        self.daily_calorie_goal
            .filter(|g| g.is_finite() && *g > 0.0)
            .unwrap_or(DEFAULT_DAILY_GOAL)
    }
}

/// Settings change for the current user's profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileUpdate {
    pub daily_calorie_goal: i64,
    pub full_name: Option<String>,
}

impl ProfileUpdate {
    /// Blank names clear the stored name.
    pub fn new(daily_calorie_goal: i64, full_name: Option<&str>) -> Result<Self, ValidationError> {
        if !(MIN_DAILY_GOAL..=MAX_DAILY_GOAL).contains(&daily_calorie_goal) {
            return Err(ValidationError::InvalidGoal(daily_calorie_goal));
        }
        let full_name = full_name.map(str::trim).filter(|n| !n.is_empty());
        if let Some(name) = full_name {
            let len = name.chars().count();
            if len > MAX_NAME_LEN {
                return Err(ValidationError::NameTooLong(len));
            }
        }
        Ok(Self {
            daily_calorie_goal,
            full_name: full_name.map(String::from),
        })
    }
}

/// Progress towards the daily goal for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_calories: f64,
    pub goal: f64,
    pub remaining: f64,
    /// Capped at 100
    pub progress_percent: f64,
    pub meals_logged: usize,
}

impl DailySummary {
    /// Meals logged on other days are ignored, but every meal is validated.
    pub fn from_meals(date: NaiveDate, meals: &[Meal], goal: f64) -> Result<Self, ValidationError> {
        for (index, meal) in meals.iter().enumerate() {
            validate_record(index, &meal.record())?;
        }
        let todays: Vec<&Meal> = meals.iter().filter(|m| m.meal_date == date).collect();
        let total_calories: f64 = todays.iter().map(|m| m.calories).sum();
        let progress_percent = if goal > 0.0 {
            (total_calories / goal * 100.0).min(100.0)
        } else {
            100.0
        };

        Ok(Self {
            date,
            total_calories,
            goal,
            remaining: (goal - total_calories).max(0.0),
            progress_percent,
            meals_logged: todays.len(),
        })
    }

    pub fn goal_reached(&self) -> bool {
        self.progress_percent >= 100.0
    }
}

/// A food match from the nutrition search function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionResult {
    pub name: String,
    #[serde(default)]
    pub serving_qty: Option<f64>,
    #[serde(default)]
    pub serving_unit: Option<String>,
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
}

impl NutritionResult {
    pub fn to_new_meal(&self) -> NewMeal {
        NewMeal::new(self.name.clone(), self.calories).with_macros(
            self.protein,
            self.carbs,
            self.fat,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meal(date: NaiveDate, calories: f64) -> Meal {
        Meal {
            id: "1".to_string(),
            user_id: "u".to_string(),
            food_name: "Oatmeal".to_string(),
            calories,
            protein: 0.0,
            carbs: 0.0,
            fat: 0.0,
            meal_date: date,
            created_at: None,
        }
    }

    #[test]
    fn summary_caps_progress_and_remaining() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let meals = vec![meal(day, 1500.0), meal(day, 900.0)];
        let summary = DailySummary::from_meals(day, &meals, 2000.0).unwrap();
        assert_eq!(summary.total_calories, 2400.0);
        assert_eq!(summary.remaining, 0.0);
        assert_eq!(summary.progress_percent, 100.0);
        assert_eq!(summary.meals_logged, 2);
        assert!(summary.goal_reached());
    }

    #[test]
    fn summary_ignores_other_days() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2024, 1, 4).unwrap();
        let meals = vec![meal(day, 500.0), meal(yesterday, 700.0)];
        let summary = DailySummary::from_meals(day, &meals, 2000.0).unwrap();
        assert_eq!(summary.total_calories, 500.0);
        assert_eq!(summary.remaining, 1500.0);
        assert_eq!(summary.progress_percent, 25.0);
        assert!(!summary.goal_reached());
    }

    #[test]
    fn summary_rejects_malformed_calories() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let meals = vec![meal(day, 300.0), meal(day, -500.0)];
        assert_eq!(
            DailySummary::from_meals(day, &meals, 2000.0),
            Err(ValidationError::InvalidCalories {
                index: 1,
                value: -500.0
            })
        );

        let meals = vec![meal(day, f64::NAN)];
        assert!(matches!(
            DailySummary::from_meals(day, &meals, 2000.0),
            Err(ValidationError::InvalidCalories { index: 0, .. })
        ));
    }

    #[test]
    fn profile_goal_defaults() {
        let mut profile = Profile {
            id: "u".to_string(),
            full_name: None,
            daily_calorie_goal: None,
        };
        assert_eq!(profile.effective_goal(), DEFAULT_DAILY_GOAL);
        profile.daily_calorie_goal = Some(1800.0);
        assert_eq!(profile.effective_goal(), 1800.0);
    }

    #[test]
    fn profile_update_bounds() {
        assert_eq!(
            ProfileUpdate::new(799, None),
            Err(ValidationError::InvalidGoal(799))
        );
        assert_eq!(
            ProfileUpdate::new(10_001, None),
            Err(ValidationError::InvalidGoal(10_001))
        );
        let update = ProfileUpdate::new(2500, Some("  Ada  ")).unwrap();
        assert_eq!(update.full_name.as_deref(), Some("Ada"));
        let blank = ProfileUpdate::new(2500, Some("   ")).unwrap();
        assert_eq!(blank.full_name, None);
        let long = "x".repeat(101);
        assert_eq!(
            ProfileUpdate::new(2500, Some(&long)),
            Err(ValidationError::NameTooLong(101))
        );
    }

    #[test]
    fn new_meal_rejects_bad_values() {
        assert_eq!(
            NewMeal::new("", 100.0).validate(),
            Err(ValidationError::EmptyFoodName)
        );
        assert!(matches!(
            NewMeal::new("Toast", -1.0).validate(),
            Err(ValidationError::InvalidNutrient { field: "calories", .. })
        ));
        assert!(matches!(
            NewMeal::new("Toast", 80.0)
                .with_macros(3.0, f64::NAN, 1.0)
                .validate(),
            Err(ValidationError::InvalidNutrient { field: "carbs", .. })
        ));
        assert!(NewMeal::new("Toast", 80.0).validate().is_ok());
    }
}
