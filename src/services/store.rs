//! Durable storage for daily and global summaries.
//!
//! Every upsert is a single-writer-per-key read-modify-write: concurrent
//! rounds touching the same `(city, date)` or `date` are serialised, so no
//! update is lost and no duplicate row can appear.
//!
//! PostgreSQL flow (one transaction per upsert):
//! 1. `INSERT … ON CONFLICT DO NOTHING RETURNING` the seeded row
//! 2. on conflict, `SELECT … FOR UPDATE` the existing row
//! 3. merge in Rust, `UPDATE`, commit

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;

use crate::db::models::{DailySummary, GlobalSummary};
use crate::db::queries;
use crate::errors::AppError;
use crate::services::aggregator::{
    merge_daily_summary, merge_global_summary, seed_daily_summary, seed_global_summary,
    RoundStats,
};
use crate::services::openweather::Observation;

/// Persistence for summaries, keyed by UTC calendar day.
#[async_trait]
pub trait SummaryStore: Send + Sync {
    /// Create or update the `(obs.city, date)` daily summary with one observation.
    async fn upsert_daily_summary(
        &self,
        date: NaiveDate,
        obs: &Observation,
    ) -> Result<DailySummary, AppError>;

    /// Create or update the global summary for `date` with one round's statistics.
    async fn upsert_global_summary(
        &self,
        date: NaiveDate,
        round: &RoundStats,
    ) -> Result<GlobalSummary, AppError>;

    /// Most recent daily summary for a city, by date.
    async fn latest_daily_summary(&self, city: &str) -> Result<Option<DailySummary>, AppError>;

    /// Most recent global summary, by date.
    async fn latest_global_summary(&self) -> Result<Option<GlobalSummary>, AppError>;
}

/// PostgreSQL-backed summary store.
#[derive(Debug, Clone)]
pub struct PgSummaryStore {
    pool: PgPool,
}

impl PgSummaryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SummaryStore for PgSummaryStore {
    async fn upsert_daily_summary(
        &self,
        date: NaiveDate,
        obs: &Observation,
    ) -> Result<DailySummary, AppError> {
        let now = Utc::now();
        let seed = seed_daily_summary(obs, date, now);

        let mut tx = self.pool.begin().await?;
        let summary = match queries::insert_daily_summary_if_absent(&mut *tx, &seed).await? {
            Some(created) => created,
            None => {
                let mut existing = queries::lock_daily_summary(&mut *tx, &obs.city, date).await?;
                merge_daily_summary(&mut existing, obs, now);
                queries::update_daily_summary(&mut *tx, &existing).await?
            }
        };
        tx.commit().await?;

        Ok(summary)
    }

    async fn upsert_global_summary(
        &self,
        date: NaiveDate,
        round: &RoundStats,
    ) -> Result<GlobalSummary, AppError> {
        let now = Utc::now();
        let seed = seed_global_summary(round, date, now);

        let mut tx = self.pool.begin().await?;
        let summary = match queries::insert_global_summary_if_absent(&mut *tx, &seed).await? {
            Some(created) => created,
            None => {
                let mut existing = queries::lock_global_summary(&mut *tx, date).await?;
                merge_global_summary(&mut existing, round, now);
                queries::update_global_summary(&mut *tx, &existing).await?
            }
        };
        tx.commit().await?;

        Ok(summary)
    }

    async fn latest_daily_summary(&self, city: &str) -> Result<Option<DailySummary>, AppError> {
        Ok(queries::get_latest_daily_summary(&self.pool, city).await?)
    }

    async fn latest_global_summary(&self) -> Result<Option<GlobalSummary>, AppError> {
        Ok(queries::get_latest_global_summary(&self.pool).await?)
    }
}

/// In-memory store for tests. One mutex guards both tables, which makes every
/// upsert trivially single-writer.
#[cfg(test)]
pub mod memory {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct Tables {
        daily: HashMap<(String, NaiveDate), DailySummary>,
        global: HashMap<NaiveDate, GlobalSummary>,
    }

    #[derive(Default)]
    pub struct MemorySummaryStore {
        tables: Mutex<Tables>,
        failing_cities: HashSet<String>,
        fail_global: bool,
    }

    impl MemorySummaryStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make daily upserts for `city` fail with a storage error.
        pub fn with_failing_city(mut self, city: &str) -> Self {
            self.failing_cities.insert(city.to_string());
            self
        }

        /// Make every global upsert fail with a storage error.
        pub fn with_failing_global(mut self) -> Self {
            self.fail_global = true;
            self
        }

        pub async fn daily_row_count(&self) -> usize {
            self.tables.lock().await.daily.len()
        }

        pub async fn global_row_count(&self) -> usize {
            self.tables.lock().await.global.len()
        }

        pub async fn daily(&self, city: &str, date: NaiveDate) -> Option<DailySummary> {
            self.tables
                .lock()
                .await
                .daily
                .get(&(city.to_string(), date))
                .cloned()
        }

        pub async fn global(&self, date: NaiveDate) -> Option<GlobalSummary> {
            self.tables.lock().await.global.get(&date).cloned()
        }
    }

    #[async_trait]
    impl SummaryStore for MemorySummaryStore {
        async fn upsert_daily_summary(
            &self,
            date: NaiveDate,
            obs: &Observation,
        ) -> Result<DailySummary, AppError> {
            if self.failing_cities.contains(&obs.city) {
                return Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut));
            }
            let now = Utc::now();
            let mut tables = self.tables.lock().await;
            let summary = tables
                .daily
                .entry((obs.city.clone(), date))
                .and_modify(|existing| merge_daily_summary(existing, obs, now))
                .or_insert_with(|| seed_daily_summary(obs, date, now));
            Ok(summary.clone())
        }

        async fn upsert_global_summary(
            &self,
            date: NaiveDate,
            round: &RoundStats,
        ) -> Result<GlobalSummary, AppError> {
            if self.fail_global {
                return Err(AppError::DatabaseError(sqlx::Error::PoolTimedOut));
            }
            let now = Utc::now();
            let mut tables = self.tables.lock().await;
            let summary = tables
                .global
                .entry(date)
                .and_modify(|existing| merge_global_summary(existing, round, now))
                .or_insert_with(|| seed_global_summary(round, date, now));
            Ok(summary.clone())
        }

        async fn latest_daily_summary(
            &self,
            city: &str,
        ) -> Result<Option<DailySummary>, AppError> {
            let tables = self.tables.lock().await;
            Ok(tables
                .daily
                .values()
                .filter(|s| s.city == city)
                .max_by_key(|s| s.date)
                .cloned())
        }

        async fn latest_global_summary(&self) -> Result<Option<GlobalSummary>, AppError> {
            let tables = self.tables.lock().await;
            Ok(tables.global.values().max_by_key(|s| s.date).cloned())
        }
    }
}
