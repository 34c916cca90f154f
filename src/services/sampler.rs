//! Concurrent fan-out of provider calls across locations.

use futures::future::join_all;

use crate::services::openweather::{Observation, WeatherProvider};

/// Fetch the current observation for every location concurrently.
///
/// Returns one entry per location, in input order; `None` marks a location
/// the provider could not serve. Resolves once every call has finished.
pub async fn sample_all(
    provider: &dyn WeatherProvider,
    locations: &[String],
) -> Vec<Option<Observation>> {
    let fetches = locations
        .iter()
        .map(|location| provider.fetch_observation(location));
    join_all(fetches).await
}
