//! OpenWeatherMap current-weather client.
//!
//! Fetches one point-in-time observation per place name.
//! See: https://openweathermap.org/current

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::errors::AppError;

const CURRENT_WEATHER_PATH: &str = "/data/2.5/weather";

/// Maximum number of response-body characters echoed into error messages.
const ERROR_BODY_PREVIEW_CHARS: usize = 200;

/// A single point-in-time weather reading for one location.
///
/// Either fully populated or not produced at all: a payload missing any of
/// these fields is treated as malformed.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// City name as resolved by the provider (may differ from the query).
    pub city: String,
    pub temperature: f64,
    pub feels_like: f64,
    /// Dominant weather category, e.g. "Clear", "Rain".
    pub condition: String,
    /// Provider observation time, epoch seconds.
    pub observed_at: i64,
    pub humidity: f64,
    pub wind_speed: f64,
}

/// Source of current-weather observations.
#[async_trait]
pub trait WeatherProvider: Send + Sync + std::fmt::Debug {
    /// Fetch the current observation for a place name.
    async fn fetch_current(&self, location: &str) -> Result<Observation, AppError>;

    /// Like [`fetch_current`](Self::fetch_current), but any failure is logged
    /// and reported as `None` so one bad location cannot abort a batch.
    async fn fetch_observation(&self, location: &str) -> Option<Observation> {
        match self.fetch_current(location).await {
            Ok(obs) => Some(obs),
            Err(e) => {
                tracing::warn!("Weather unavailable for '{}': {}", location, e);
                None
            }
        }
    }
}

/// Client for the OpenWeatherMap current-weather API.
#[derive(Clone)]
pub struct OpenWeatherClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for OpenWeatherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

// --- OpenWeatherMap JSON response types ---

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

impl OpenWeatherClient {
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn fetch_current(&self, location: &str) -> Result<Observation, AppError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(AppError::BadRequest("Location name must not be empty".into()));
        }

        let url = format!("{}{}", self.base_url, CURRENT_WEATHER_PATH);

        // `without_url` keeps the API key (a query parameter) out of logs.
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", location),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!(
                    "OpenWeather request failed: {}",
                    e.without_url()
                ))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::ExternalServiceError(format!(
                "OpenWeather response body unreadable: {}",
                e.without_url()
            ))
        })?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("Unknown location '{}'", location)));
        }

        if !status.is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "OpenWeather returned HTTP {}: {}",
                status,
                truncate_body(&body)
            )));
        }

        parse_current_response(&body)
    }
}

/// Parse an OpenWeatherMap current-weather body into an [`Observation`].
fn parse_current_response(body: &str) -> Result<Observation, AppError> {
    let parsed: OwCurrentResponse = serde_json::from_str(body).map_err(|e| {
        AppError::ExternalServiceError(format!("OpenWeather JSON parse error: {}", e))
    })?;

    let condition = parsed
        .weather
        .into_iter()
        .next()
        .map(|w| w.main)
        .ok_or_else(|| {
            AppError::ExternalServiceError("OpenWeather response has no weather category".into())
        })?;

    Ok(Observation {
        city: parsed.name,
        temperature: parsed.main.temp,
        feels_like: parsed.main.feels_like,
        condition,
        observed_at: parsed.dt,
        humidity: parsed.main.humidity,
        wind_speed: parsed.wind.speed,
    })
}

fn truncate_body(body: &str) -> String {
    if body.chars().count() <= ERROR_BODY_PREVIEW_CHARS {
        body.to_string()
    } else {
        let preview: String = body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
        format!("{}…", preview)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn delhi_payload() -> serde_json::Value {
        json!({
            "name": "Delhi",
            "dt": 1_760_000_000,
            "main": { "temp": 31.5, "feels_like": 34.2, "humidity": 48 },
            "weather": [ { "id": 800, "main": "Clear", "description": "clear sky" } ],
            "wind": { "speed": 3.6, "deg": 270 }
        })
    }

    fn client_for(server: &MockServer) -> OpenWeatherClient {
        OpenWeatherClient::new("test-key", &server.uri(), Duration::from_secs(5))
    }

    #[test]
    fn test_parse_current_response() {
        let obs = parse_current_response(&delhi_payload().to_string()).unwrap();
        assert_eq!(
            obs,
            Observation {
                city: "Delhi".to_string(),
                temperature: 31.5,
                feels_like: 34.2,
                condition: "Clear".to_string(),
                observed_at: 1_760_000_000,
                humidity: 48.0,
                wind_speed: 3.6,
            }
        );
    }

    #[test]
    fn test_parse_current_response_uses_first_weather_entry() {
        let mut payload = delhi_payload();
        payload["weather"] = json!([{ "main": "Haze" }, { "main": "Smoke" }]);
        let obs = parse_current_response(&payload.to_string()).unwrap();
        assert_eq!(obs.condition, "Haze");
    }

    #[test]
    fn test_parse_current_response_empty_weather_is_malformed() {
        let mut payload = delhi_payload();
        payload["weather"] = json!([]);
        let err = parse_current_response(&payload.to_string()).unwrap_err();
        assert!(matches!(err, AppError::ExternalServiceError(_)));
    }

    #[test]
    fn test_parse_current_response_missing_field() {
        let mut payload = delhi_payload();
        payload["main"].as_object_mut().unwrap().remove("temp");
        assert_err!(parse_current_response(&payload.to_string()));
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(truncate_body("short"), "short");
        let long = "x".repeat(500);
        assert_eq!(truncate_body(&long).chars().count(), ERROR_BODY_PREVIEW_CHARS + 1);
    }

    #[tokio::test]
    async fn test_fetch_current_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "Delhi"))
            .and(query_param("appid", "test-key"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(delhi_payload()))
            .expect(1)
            .mount(&server)
            .await;

        let obs = assert_ok!(client_for(&server).fetch_current("Delhi").await);
        assert_eq!(obs.city, "Delhi");
        assert_eq!(obs.temperature, 31.5);
        assert_eq!(obs.condition, "Clear");
    }

    #[tokio::test]
    async fn test_fetch_current_unknown_city_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({ "cod": "404", "message": "city not found" })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.fetch_current("Atlantis").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);
        assert_eq!(client.fetch_observation("Atlantis").await, None);
    }

    #[tokio::test]
    async fn test_fetch_observation_server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.fetch_current("Delhi").await.unwrap_err();
        assert!(matches!(err, AppError::ExternalServiceError(_)));
        assert!(err.to_string().contains("503"));
        assert_eq!(client.fetch_observation("Delhi").await, None);
    }

    #[tokio::test]
    async fn test_fetch_observation_malformed_json_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        assert_eq!(client_for(&server).fetch_observation("Delhi").await, None);
    }

    #[tokio::test]
    async fn test_fetch_current_rejects_empty_location_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(delhi_payload()))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_current("   ").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_fetch_observation_unreachable_host() {
        // Port 9 (discard) on localhost is not serving HTTP.
        let client = OpenWeatherClient::new("k", "http://127.0.0.1:9", Duration::from_secs(2));
        assert_eq!(client.fetch_observation("Delhi").await, None);
    }

    #[test]
    fn test_debug_does_not_leak_api_key() {
        let client = OpenWeatherClient::new("secret-key", "http://x", Duration::from_secs(1));
        assert!(!format!("{:?}", client).contains("secret-key"));
    }
}
