//! Current weather endpoint.
//!
//! GET /api/v1/weather/:city asks the provider directly; it does not read
//! stored summaries.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::{AppError, ErrorResponse};
use crate::helpers::unix_to_utc;
use crate::routes::AppState;
use crate::services::openweather::Observation;

/// A point-in-time observation for one city.
#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentWeatherResponse {
    /// City name as resolved by the provider
    pub city: String,
    /// Air temperature in Celsius
    pub temperature_c: f64,
    /// Feels-like temperature in Celsius
    pub feels_like_c: f64,
    /// Weather category (e.g. "Clear", "Rain")
    pub condition: String,
    /// Provider observation time (ISO 8601). Null if the provider timestamp is out of range.
    pub observed_at: Option<String>,
    /// Relative humidity percentage
    pub humidity_pct: f64,
    /// Wind speed as reported by the provider (metric units)
    pub wind_speed: f64,
}

impl From<Observation> for CurrentWeatherResponse {
    fn from(o: Observation) -> Self {
        Self {
            observed_at: unix_to_utc(o.observed_at).map(|dt| dt.to_rfc3339()),
            city: o.city,
            temperature_c: o.temperature,
            feels_like_c: o.feels_like,
            condition: o.condition,
            humidity_pct: o.humidity,
            wind_speed: o.wind_speed,
        }
    }
}

/// Get the current weather for a city.
#[utoipa::path(
    get,
    path = "/api/v1/weather/{city}",
    tag = "Weather",
    params(
        ("city" = String, Path, description = "Place name, resolved by the provider"),
    ),
    responses(
        (status = 200, description = "Current observation", body = CurrentWeatherResponse),
        (status = 400, description = "Empty city name", body = ErrorResponse),
        (status = 404, description = "Provider does not know the city", body = ErrorResponse),
        (status = 502, description = "Provider unreachable or returned a bad payload", body = ErrorResponse),
    )
)]
pub async fn get_current_weather(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> Result<Json<CurrentWeatherResponse>, AppError> {
    let observation = state.provider.fetch_current(&city).await?;
    Ok(Json(observation.into()))
}
