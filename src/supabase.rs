use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::SupabaseAuth;
use crate::error::ValidationError;
use crate::models::Meal;

/// What to do with a calorie value that is missing or not a number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Coercion {
    /// Reject the row.
    #[default]
    Strict,
    /// Count it as zero.
    Lenient,
}

/// PostgREST tables and edge functions of a Supabase project.
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    auth: SupabaseAuth,
}

impl SupabaseClient {
    pub fn new(auth: SupabaseAuth) -> Self {
        Self {
            client: Client::new(),
            auth,
        }
    }

    pub fn auth(&self) -> &SupabaseAuth {
        &self.auth
    }

    async fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.auth.get_access_token().await?;
        Ok(builder
            .header("apikey", &self.auth.config().anon_key)
            .bearer_auth(token))
    }

    fn table_url(&self, table: &str) -> String {
        self.auth.config().endpoint(&format!("rest/v1/{}", table))
    }

    async fn check(resp: Response, what: &str) -> Result<Response> {
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("{} failed: {} - {}", what, status, body));
        }
        Ok(resp)
    }

    /// Rows of `table` matching `query` (PostgREST `select`, filters, `order`).
    pub async fn select(&self, table: &str, query: &[(&str, String)]) -> Result<Vec<Value>> {
        debug!(table, ?query, "select");
        let req = self.client.get(self.table_url(table)).query(query);
        let resp = self.authorized(req).await?.send().await?;
        let resp = Self::check(resp, &format!("SELECT {}", table)).await?;
        Ok(resp.json().await?)
    }

    /// Inserts rows and returns them as stored.
    pub async fn insert<T: Serialize + ?Sized>(&self, table: &str, rows: &T) -> Result<Vec<Value>> {
        debug!(table, "insert");
        let req = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(rows);
        let resp = self.authorized(req).await?.send().await?;
        let resp = Self::check(resp, &format!("INSERT {}", table)).await?;
        Ok(resp.json().await?)
    }

    /// Patches the rows matching `filters` and returns them as stored.
    pub async fn update<T: Serialize + ?Sized>(
        &self,
        table: &str,
        filters: &[(&str, String)],
        body: &T,
    ) -> Result<Vec<Value>> {
        debug!(table, ?filters, "update");
        let req = self
            .client
            .patch(self.table_url(table))
            .query(filters)
            .header("Prefer", "return=representation")
            .json(body);
        let resp = self.authorized(req).await?.send().await?;
        let resp = Self::check(resp, &format!("UPDATE {}", table)).await?;
        Ok(resp.json().await?)
    }

    pub async fn delete(&self, table: &str, filters: &[(&str, String)]) -> Result<()> {
        debug!(table, ?filters, "delete");
        let req = self.client.delete(self.table_url(table)).query(filters);
        let resp = self.authorized(req).await?.send().await?;
        Self::check(resp, &format!("DELETE {}", table)).await?;
        Ok(())
    }

    /// Calls an edge function with a JSON body.
    pub async fn invoke<T: Serialize + ?Sized>(&self, function: &str, body: &T) -> Result<Value> {
        debug!(function, "invoke");
        let url = self
            .auth
            .config()
            .endpoint(&format!("functions/v1/{}", function));
        let req = self.client.post(url).json(body);
        let resp = self.authorized(req).await?.send().await?;
        let resp = Self::check(resp, &format!("Function {}", function)).await?;
        Ok(resp.json().await?)
    }
}

/// `eq.` filter value.
pub fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

/// Reads a finite number that may arrive as a JSON number or a numeric string.
pub fn parse_num(val: Option<&Value>) -> Option<f64> {
    val.and_then(|v| {
        v.as_f64()
            .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
    })
    .filter(|n: &f64| n.is_finite())
}

/// Reads an id column, which may be a uuid string or an integer.
pub fn parse_id(val: Option<&Value>) -> Option<String> {
    val.and_then(|v| {
        v.as_str()
            .map(String::from)
            .or_else(|| v.as_i64().map(|n| n.to_string()))
    })
}

fn invalid(index: usize, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidRecord {
        index,
        reason: reason.into(),
    }
}

/// Turns a `meals` row into a [`Meal`]. `index` is the row's position in the response.
pub fn parse_meal(row: &Value, index: usize, coercion: Coercion) -> Result<Meal, ValidationError> {
    let obj = row
        .as_object()
        .ok_or_else(|| invalid(index, "row is not an object"))?;

    let meal_date = obj
        .get("meal_date")
        .and_then(|v| v.as_str())
        .ok_or_else(|| invalid(index, "missing meal_date"))?;
    let meal_date = NaiveDate::parse_from_str(meal_date, "%Y-%m-%d")
        .map_err(|e| invalid(index, format!("bad meal_date {:?}: {}", meal_date, e)))?;

    let calories = match (parse_num(obj.get("calories")), coercion) {
        (Some(c), _) => c,
        (None, Coercion::Lenient) => {
            warn!(index, raw = ?obj.get("calories"), "non-numeric calories counted as 0");
            0.0
        }
        (None, Coercion::Strict) => {
            return Err(invalid(
                index,
                format!("non-numeric calories {:?}", obj.get("calories")),
            ))
        }
    };

    let created_at = obj
        .get("created_at")
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Ok(Meal {
        id: parse_id(obj.get("id")).unwrap_or_default(),
        user_id: obj
            .get("user_id")
            .and_then(|v| v.as_str())
            .map(String::from)
            .ok_or_else(|| invalid(index, "missing user_id"))?,
        food_name: obj
            .get("food_name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        calories,
        protein: parse_num(obj.get("protein")).unwrap_or(0.0),
        carbs: parse_num(obj.get("carbs")).unwrap_or(0.0),
        fat: parse_num(obj.get("fat")).unwrap_or(0.0),
        meal_date,
        created_at,
    })
}

pub fn parse_meals(rows: &[Value], coercion: Coercion) -> Result<Vec<Meal>, ValidationError> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| parse_meal(row, index, coercion))
        .collect()
}
