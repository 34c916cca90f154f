//! Per-city and global daily aggregation.
//!
//! Both summaries use the same update rules across a day:
//! - averages are pairwise: `(stored + new) / 2`, not a cumulative mean
//! - max/min track the true extremes of everything seen that day
//! - `dominant_weather` is last-write-wins (the latest observation for a
//!   city, the latest round's most frequent category for the global summary)
//!
//! Within one round the global statistics are exact: true max/min with the
//! first city reaching them, arithmetic mean, and the most frequent category
//! (first-encountered wins on ties).

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::db::models::{DailySummary, GlobalSummary};
use crate::errors::AppError;
use crate::helpers::pairwise_average;
use crate::services::openweather::Observation;
use crate::services::store::SummaryStore;

// ---------------------------------------------------------------------------
// Per-city aggregation
// ---------------------------------------------------------------------------

/// Build the first daily summary of the day for a city from one observation.
pub fn seed_daily_summary(obs: &Observation, date: NaiveDate, now: DateTime<Utc>) -> DailySummary {
    DailySummary {
        id: Uuid::new_v4(),
        city: obs.city.clone(),
        date,
        average_temperature: obs.temperature,
        max_temperature: obs.temperature,
        min_temperature: obs.temperature,
        dominant_weather: obs.condition.clone(),
        average_humidity: obs.humidity,
        average_wind_speed: obs.wind_speed,
        created_at: now,
        updated_at: now,
    }
}

/// Fold one more observation into an existing daily summary.
pub fn merge_daily_summary(summary: &mut DailySummary, obs: &Observation, now: DateTime<Utc>) {
    summary.average_temperature = pairwise_average(summary.average_temperature, obs.temperature);
    summary.max_temperature = summary.max_temperature.max(obs.temperature);
    summary.min_temperature = summary.min_temperature.min(obs.temperature);
    summary.average_humidity = pairwise_average(summary.average_humidity, obs.humidity);
    summary.average_wind_speed = pairwise_average(summary.average_wind_speed, obs.wind_speed);
    summary.dominant_weather = obs.condition.clone();
    summary.updated_at = now;
}

/// Apply one fresh observation to its city's summary for `today`.
pub async fn apply_observation(
    store: &dyn SummaryStore,
    obs: &Observation,
    today: NaiveDate,
) -> Result<DailySummary, AppError> {
    let summary = store.upsert_daily_summary(today, obs).await?;
    tracing::debug!(
        "Daily summary {} {}: avg {:.2}°C, max {:.2}°C, min {:.2}°C, {}",
        summary.city,
        summary.date,
        summary.average_temperature,
        summary.max_temperature,
        summary.min_temperature,
        summary.dominant_weather,
    );
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Global aggregation
// ---------------------------------------------------------------------------

/// Cross-city statistics of a single sampling round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundStats {
    pub max_temperature: f64,
    pub max_temperature_city: String,
    pub min_temperature: f64,
    pub min_temperature_city: String,
    pub average_temperature: f64,
    pub dominant_weather: String,
}

impl RoundStats {
    /// Compute the round statistics, or `None` for a round with no observations.
    pub fn from_observations(observations: &[Observation]) -> Option<Self> {
        let first = observations.first()?;

        let mut max = first;
        let mut min = first;
        let mut sum = 0.0;
        for obs in observations {
            // Strict comparisons keep the first city reaching an extreme.
            if obs.temperature > max.temperature {
                max = obs;
            }
            if obs.temperature < min.temperature {
                min = obs;
            }
            sum += obs.temperature;
        }

        let dominant = dominant_category(observations.iter().map(|o| o.condition.as_str()))?;

        Some(Self {
            max_temperature: max.temperature,
            max_temperature_city: max.city.clone(),
            min_temperature: min.temperature,
            min_temperature_city: min.city.clone(),
            average_temperature: sum / observations.len() as f64,
            dominant_weather: dominant.to_string(),
        })
    }
}

/// The most frequent category. Among categories tied on the highest count,
/// the one encountered first wins.
pub fn dominant_category<'a>(categories: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for category in categories {
        let count = counts.entry(category).or_insert(0);
        if *count == 0 {
            first_seen.push(category);
        }
        *count += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for category in first_seen {
        let count = counts[category];
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((category, count));
        }
    }
    best.map(|(category, _)| category)
}

/// Build the first global summary of the day from one round.
pub fn seed_global_summary(round: &RoundStats, date: NaiveDate, now: DateTime<Utc>) -> GlobalSummary {
    GlobalSummary {
        id: Uuid::new_v4(),
        date,
        max_temperature: round.max_temperature,
        max_temperature_city: round.max_temperature_city.clone(),
        min_temperature: round.min_temperature,
        min_temperature_city: round.min_temperature_city.clone(),
        average_temperature: round.average_temperature,
        dominant_weather: round.dominant_weather.clone(),
        created_at: now,
        updated_at: now,
    }
}

/// Fold one more round into an existing global summary.
///
/// City attribution is decided against the stored extremes before they are
/// overwritten; a round that only ties the stored extreme keeps the stored city.
pub fn merge_global_summary(summary: &mut GlobalSummary, round: &RoundStats, now: DateTime<Utc>) {
    summary.average_temperature =
        pairwise_average(summary.average_temperature, round.average_temperature);

    if round.max_temperature > summary.max_temperature {
        summary.max_temperature = round.max_temperature;
        summary.max_temperature_city = round.max_temperature_city.clone();
    }
    if round.min_temperature < summary.min_temperature {
        summary.min_temperature = round.min_temperature;
        summary.min_temperature_city = round.min_temperature_city.clone();
    }

    summary.dominant_weather = round.dominant_weather.clone();
    summary.updated_at = now;
}

/// Apply one round's valid observations to the global summary for `today`.
///
/// An empty round writes nothing and returns `Ok(None)`.
pub async fn apply_round(
    store: &dyn SummaryStore,
    observations: &[Observation],
    today: NaiveDate,
) -> Result<Option<GlobalSummary>, AppError> {
    let Some(round) = RoundStats::from_observations(observations) else {
        tracing::debug!("Global summary: empty round, nothing to aggregate");
        return Ok(None);
    };

    let summary = store.upsert_global_summary(today, &round).await?;
    tracing::debug!(
        "Global summary {}: max {:.2}°C ({}), min {:.2}°C ({}), avg {:.2}°C, {}",
        summary.date,
        summary.max_temperature,
        summary.max_temperature_city,
        summary.min_temperature,
        summary.min_temperature_city,
        summary.average_temperature,
        summary.dominant_weather,
    );
    Ok(Some(summary))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
