//! Client library for a Supabase-backed calorie tracker, built around a
//! pure 7-day calorie trend aggregator.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod source;
pub mod supabase;
pub mod trend;

pub use client::CalorieClient;
pub use error::ValidationError;
pub use trend::{compute_trend, compute_trend_with};
