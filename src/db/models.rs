use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Running weather summary for one city on one UTC calendar day.
/// Unique on `(city, date)`.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DailySummary {
    pub id: Uuid,
    pub city: String,
    pub date: NaiveDate,
    pub average_temperature: f64,
    pub max_temperature: f64,
    pub min_temperature: f64,
    /// Category of the most recent observation (last-write-wins).
    pub dominant_weather: String,
    pub average_humidity: f64,
    pub average_wind_speed: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Running cross-city summary for one UTC calendar day. Unique on `date`.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct GlobalSummary {
    pub id: Uuid,
    pub date: NaiveDate,
    pub max_temperature: f64,
    pub max_temperature_city: String,
    pub min_temperature: f64,
    pub min_temperature_city: String,
    pub average_temperature: f64,
    /// Most frequent category of the most recent round (last-write-wins).
    pub dominant_weather: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
