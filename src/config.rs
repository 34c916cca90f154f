/// Locations sampled each round when `WEATHER_CITIES` is not set.
pub const DEFAULT_CITIES: &[&str] = &[
    "Delhi",
    "Mumbai",
    "Chennai",
    "Bangalore",
    "Kolkata",
    "Hyderabad",
];

/// Default sampling period (5 minutes).
const DEFAULT_SAMPLING_INTERVAL_SECS: u64 = 300;

/// Default per-request timeout for provider calls.
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;

const DEFAULT_OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org";

/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub openweather_api_key: String,
    pub openweather_base_url: String,
    pub port: u16,
    /// Locations sampled every round, in round order.
    pub cities: Vec<String>,
    pub sampling_interval_secs: u64,
    pub provider_timeout_secs: u64,
    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            openweather_api_key: std::env::var("OPENWEATHER_API_KEY")
                .expect("OPENWEATHER_API_KEY must be set"),
            openweather_base_url: std::env::var("OPENWEATHER_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENWEATHER_BASE_URL.to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .expect("PORT must be a valid u16"),
            cities: std::env::var("WEATHER_CITIES")
                .map(|raw| parse_city_list(&raw))
                .unwrap_or_else(|_| DEFAULT_CITIES.iter().map(|c| c.to_string()).collect()),
            sampling_interval_secs: parse_positive_secs(
                "SAMPLING_INTERVAL_SECS",
                std::env::var("SAMPLING_INTERVAL_SECS").ok().as_deref(),
                DEFAULT_SAMPLING_INTERVAL_SECS,
            ),
            provider_timeout_secs: parse_positive_secs(
                "PROVIDER_TIMEOUT_SECS",
                std::env::var("PROVIDER_TIMEOUT_SECS").ok().as_deref(),
                DEFAULT_PROVIDER_TIMEOUT_SECS,
            ),
            json_logs: std::env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }
}

/// Parse a duration in whole seconds, falling back to `default` when unset.
///
/// Zero is rejected along with non-numeric input: a zero interval cannot drive
/// a timer and a zero timeout fails every provider call.
fn parse_positive_secs(name: &str, raw: Option<&str>, default: u64) -> u64 {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => secs,
        _ => panic!("{name} must be a positive number of seconds, got {raw:?}"),
    }
}

/// Split a comma-separated city list, trimming whitespace and dropping blanks.
fn parse_city_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}
