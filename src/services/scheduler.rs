//! Background scheduler for sampling rounds.
//!
//! Architecture:
//! - A single `tokio::time::interval` timer (5 minutes by default) fires rounds
//! - Each tick spawns its round into a `JoinSet`, so a slow round never holds
//!   up the timer; overlapping rounds are safe because every summary upsert is
//!   single-writer per key
//! - A round: fan out provider calls, then run the per-city updates and the
//!   global update concurrently with each other
//! - Failures stay inside the round: an unavailable city is skipped, a storage
//!   error fails only that one update, and the next tick is the retry
//! - `stop()` halts the timer and waits for in-flight rounds to finish
//! - State is in-memory (`Arc<RwLock<SchedulerState>>`) and served by the
//!   status endpoint

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use utoipa::ToSchema;

use crate::helpers::utc_today;
use crate::services::aggregator::{apply_observation, apply_round};
use crate::services::openweather::{Observation, WeatherProvider};
use crate::services::sampler::sample_all;
use crate::services::store::SummaryStore;

// ---------------------------------------------------------------------------
// Scheduler state (in-memory, shared via Arc<RwLock<>>)
// ---------------------------------------------------------------------------

/// Outcome of one sampling round.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoundReport {
    /// UTC calendar day the round aggregated into
    pub date: NaiveDate,
    pub locations_requested: usize,
    pub observations_received: usize,
    /// Locations the provider could not serve this round
    pub unavailable_locations: Vec<String>,
    pub daily_updated: usize,
    pub daily_failed: usize,
    /// "updated", "skipped" (no observations), or "error: …"
    pub global_result: String,
}

/// Scheduler state, exposed via the status endpoint.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SchedulerState {
    pub active: bool,
    pub interval_secs: u64,
    pub cities: Vec<String>,
    pub next_round_at: Option<DateTime<Utc>>,
    pub last_round_started_at: Option<DateTime<Utc>>,
    pub last_round_completed_at: Option<DateTime<Utc>>,
    pub last_round_duration_ms: Option<u64>,
    pub total_rounds: u64,
    pub last_round: Option<RoundReport>,
}

impl SchedulerState {
    pub fn new(cities: Vec<String>) -> Self {
        Self {
            active: false,
            interval_secs: 0,
            cities,
            next_round_at: None,
            last_round_started_at: None,
            last_round_completed_at: None,
            last_round_duration_ms: None,
            total_rounds: 0,
            last_round: None,
        }
    }
}

/// Shared scheduler state handle.
pub type SharedSchedulerState = Arc<RwLock<SchedulerState>>;

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Runs sampling rounds over a fixed list of cities.
#[derive(Clone)]
pub struct Scheduler {
    provider: Arc<dyn WeatherProvider>,
    store: Arc<dyn SummaryStore>,
    cities: Arc<[String]>,
    state: SharedSchedulerState,
}

impl Scheduler {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        store: Arc<dyn SummaryStore>,
        cities: Vec<String>,
    ) -> Self {
        let state = Arc::new(RwLock::new(SchedulerState::new(cities.clone())));
        Self {
            provider,
            store,
            cities: cities.into(),
            state,
        }
    }

    pub fn state(&self) -> SharedSchedulerState {
        self.state.clone()
    }

    /// Run one complete round now: sample every city, then update the
    /// per-city and global summaries for today.
    pub async fn run_round(&self) -> RoundReport {
        let started = Utc::now();
        self.state.write().await.last_round_started_at = Some(started);

        let today = utc_today();
        tracing::info!(
            "Scheduler: sampling {} locations for {}",
            self.cities.len(),
            today
        );

        let results = sample_all(self.provider.as_ref(), &self.cities).await;
        let (observations, unavailable_locations) = partition_results(&self.cities, results);

        let report = self
            .aggregate(today, &observations, unavailable_locations)
            .await;

        let completed = Utc::now();
        let duration_ms = (completed - started).num_milliseconds().max(0) as u64;
        {
            let mut s = self.state.write().await;
            s.last_round_completed_at = Some(completed);
            s.last_round_duration_ms = Some(duration_ms);
            s.total_rounds += 1;
            s.last_round = Some(report.clone());
        }

        tracing::info!(
            "Scheduler: round complete in {}ms: {}/{} observations, {} daily updated, {} failed, global {}",
            duration_ms,
            report.observations_received,
            report.locations_requested,
            report.daily_updated,
            report.daily_failed,
            report.global_result,
        );

        report
    }

    /// Run the per-city updates and the global update concurrently.
    async fn aggregate(
        &self,
        today: NaiveDate,
        observations: &[Observation],
        unavailable_locations: Vec<String>,
    ) -> RoundReport {
        let store = self.store.as_ref();
        let daily_updates = join_all(
            observations
                .iter()
                .map(|obs| apply_observation(store, obs, today)),
        );
        let global_update = apply_round(store, observations, today);

        let (daily_results, global_result) = tokio::join!(daily_updates, global_update);

        let mut daily_updated = 0;
        let mut daily_failed = 0;
        for (obs, result) in observations.iter().zip(daily_results) {
            match result {
                Ok(_) => daily_updated += 1,
                Err(e) => {
                    daily_failed += 1;
                    tracing::error!(
                        "Scheduler: failed to update daily summary for {}: {}",
                        obs.city,
                        e
                    );
                }
            }
        }

        let global_result = match global_result {
            Ok(Some(_)) => "updated".to_string(),
            Ok(None) => "skipped".to_string(),
            Err(e) => {
                tracing::error!("Scheduler: failed to update global summary: {}", e);
                format!("error: {}", e)
            }
        };

        RoundReport {
            date: today,
            locations_requested: self.cities.len(),
            observations_received: observations.len(),
            unavailable_locations,
            daily_updated,
            daily_failed,
            global_result,
        }
    }

    /// Start the recurring timer. The first round runs immediately.
    pub fn start(self, interval: Duration) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            tracing::info!(
                "Scheduler started: {} locations every {}s",
                self.cities.len(),
                interval.as_secs()
            );
            {
                let mut s = self.state.write().await;
                s.active = true;
                s.interval_secs = interval.as_secs();
            }

            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut in_flight = JoinSet::new();

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.state.write().await.next_round_at = ChronoDuration::from_std(interval)
                            .ok()
                            .map(|d| Utc::now() + d);
                        let scheduler = self.clone();
                        in_flight.spawn(async move {
                            scheduler.run_round().await;
                        });
                    }
                    Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                        if let Err(e) = joined {
                            tracing::error!("Scheduler: round task failed: {}", e);
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }

            let pending = in_flight.len();
            if pending > 0 {
                tracing::info!("Scheduler: waiting for {} in-flight round(s)", pending);
            }
            while let Some(joined) = in_flight.join_next().await {
                if let Err(e) = joined {
                    tracing::error!("Scheduler: round task failed: {}", e);
                }
            }

            {
                let mut s = self.state.write().await;
                s.active = false;
                s.next_round_at = None;
            }
            tracing::info!("Scheduler stopped");
        });

        SchedulerHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Split fan-out results into observations and the names of locations that
/// produced none.
fn partition_results(
    locations: &[String],
    results: Vec<Option<Observation>>,
) -> (Vec<Observation>, Vec<String>) {
    let mut observations = Vec::with_capacity(results.len());
    let mut unavailable = Vec::new();
    for (location, result) in locations.iter().zip(results) {
        match result {
            Some(obs) => observations.push(obs),
            None => unavailable.push(location.clone()),
        }
    }
    (observations, unavailable)
}

/// Handle to a running scheduler.
#[derive(Debug)]
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop the timer and wait for in-flight rounds to complete.
    pub async fn stop(self) {
        // A send error means the task already exited.
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::error!("Scheduler task ended abnormally: {}", e);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
