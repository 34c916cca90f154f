//! Summary HTTP endpoints.
//!
//! - GET /api/v1/summaries/daily/:city
//! - GET /api/v1/summaries/global

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::models;
use crate::errors::{AppError, ErrorResponse};
use crate::routes::AppState;

/// Per-city running summary for one day.
#[derive(Debug, Serialize, ToSchema)]
pub struct DailySummaryResponse {
    pub id: Uuid,
    pub city: String,
    /// UTC calendar day (YYYY-MM-DD)
    pub date: String,
    /// Pairwise running average in Celsius
    pub average_temperature: f64,
    pub max_temperature: f64,
    pub min_temperature: f64,
    /// Category of the latest observation
    pub dominant_weather: String,
    pub average_humidity: f64,
    pub average_wind_speed: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<models::DailySummary> for DailySummaryResponse {
    fn from(s: models::DailySummary) -> Self {
        Self {
            id: s.id,
            city: s.city,
            date: s.date.to_string(),
            average_temperature: s.average_temperature,
            max_temperature: s.max_temperature,
            min_temperature: s.min_temperature,
            dominant_weather: s.dominant_weather,
            average_humidity: s.average_humidity,
            average_wind_speed: s.average_wind_speed,
            created_at: s.created_at.to_rfc3339(),
            updated_at: s.updated_at.to_rfc3339(),
        }
    }
}

/// Cross-city running summary for one day.
#[derive(Debug, Serialize, ToSchema)]
pub struct GlobalSummaryResponse {
    pub id: Uuid,
    /// UTC calendar day (YYYY-MM-DD)
    pub date: String,
    pub max_temperature: f64,
    /// City that produced `max_temperature`
    pub max_temperature_city: String,
    pub min_temperature: f64,
    /// City that produced `min_temperature`
    pub min_temperature_city: String,
    pub average_temperature: f64,
    /// Most frequent category of the latest round
    pub dominant_weather: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<models::GlobalSummary> for GlobalSummaryResponse {
    fn from(s: models::GlobalSummary) -> Self {
        Self {
            id: s.id,
            date: s.date.to_string(),
            max_temperature: s.max_temperature,
            max_temperature_city: s.max_temperature_city,
            min_temperature: s.min_temperature,
            min_temperature_city: s.min_temperature_city,
            average_temperature: s.average_temperature,
            dominant_weather: s.dominant_weather,
            created_at: s.created_at.to_rfc3339(),
            updated_at: s.updated_at.to_rfc3339(),
        }
    }
}

/// Get the most recent daily summary for a city.
#[utoipa::path(
    get,
    path = "/api/v1/summaries/daily/{city}",
    tag = "Summaries",
    params(
        ("city" = String, Path, description = "City name as stored by the sampler"),
    ),
    responses(
        (status = 200, description = "Latest daily summary", body = DailySummaryResponse),
        (status = 404, description = "No summary recorded for the city", body = ErrorResponse),
    )
)]
pub async fn get_daily_summary(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> Result<Json<DailySummaryResponse>, AppError> {
    let summary = state
        .store
        .latest_daily_summary(&city)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No daily summary for {}", city)))?;

    Ok(Json(summary.into()))
}

/// Get the most recent global summary.
#[utoipa::path(
    get,
    path = "/api/v1/summaries/global",
    tag = "Summaries",
    responses(
        (status = 200, description = "Latest global summary", body = GlobalSummaryResponse),
        (status = 404, description = "No global summary recorded yet", body = ErrorResponse),
    )
)]
pub async fn get_global_summary(
    State(state): State<AppState>,
) -> Result<Json<GlobalSummaryResponse>, AppError> {
    let summary = state
        .store
        .latest_global_summary()
        .await?
        .ok_or_else(|| AppError::NotFound("No global summary recorded yet".to_string()))?;

    Ok(Json(summary.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::aggregator::{apply_observation, apply_round};
    use crate::services::openweather::Observation;
    use crate::services::sampler::stub::StubProvider;
    use crate::services::store::memory::MemorySummaryStore;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn obs(city: &str, temperature: f64) -> Observation {
        Observation {
            city: city.to_string(),
            temperature,
            feels_like: temperature,
            condition: "Clear".to_string(),
            observed_at: 0,
            humidity: 50.0,
            wind_speed: 2.0,
        }
    }

    fn state_with(store: Arc<MemorySummaryStore>) -> AppState {
        AppState {
            store,
            provider: Arc::new(StubProvider::new()),
        }
    }

    #[tokio::test]
    async fn test_get_daily_summary_returns_latest_day() {
        let store = Arc::new(MemorySummaryStore::new());
        let d1 = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        apply_observation(store.as_ref(), &obs("Delhi", 25.0), d1)
            .await
            .unwrap();
        apply_observation(store.as_ref(), &obs("Delhi", 30.0), d2)
            .await
            .unwrap();
        apply_observation(store.as_ref(), &obs("Mumbai", 33.0), d2)
            .await
            .unwrap();

        let Json(body) = get_daily_summary(State(state_with(store)), Path("Delhi".into()))
            .await
            .unwrap();

        assert_eq!(body.city, "Delhi");
        assert_eq!(body.date, "2026-10-18");
        assert_eq!(body.average_temperature, 30.0);
    }

    #[tokio::test]
    async fn test_get_daily_summary_not_found() {
        let store = Arc::new(MemorySummaryStore::new());
        let err = get_daily_summary(State(state_with(store)), Path("Delhi".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_global_summary() {
        let store = Arc::new(MemorySummaryStore::new());
        let day = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        apply_round(
            store.as_ref(),
            &[obs("Delhi", 30.0), obs("Mumbai", 35.0), obs("Chennai", 28.0)],
            day,
        )
        .await
        .unwrap();

        let Json(body) = get_global_summary(State(state_with(store))).await.unwrap();

        assert_eq!(body.date, "2026-10-18");
        assert_eq!(body.max_temperature_city, "Mumbai");
        assert_eq!(body.min_temperature_city, "Chennai");
        assert_eq!(body.average_temperature, 31.0);
    }

    #[tokio::test]
    async fn test_get_global_summary_not_found() {
        let store = Arc::new(MemorySummaryStore::new());
        let err = get_global_summary(State(state_with(store))).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
