use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};

use super::models::{DailySummary, GlobalSummary};

// ---------------------------------------------------------------------------
// Daily summaries
// ---------------------------------------------------------------------------

/// Insert a freshly seeded daily summary unless one already exists for its
/// `(city, date)`. Returns the inserted row, or `None` on conflict.
pub async fn insert_daily_summary_if_absent(
    conn: &mut PgConnection,
    seed: &DailySummary,
) -> Result<Option<DailySummary>, sqlx::Error> {
    sqlx::query_as::<_, DailySummary>(
        "INSERT INTO daily_summaries (
            id, city, date, average_temperature, max_temperature, min_temperature,
            dominant_weather, average_humidity, average_wind_speed, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (city, date) DO NOTHING
        RETURNING id, city, date, average_temperature, max_temperature, min_temperature,
                  dominant_weather, average_humidity, average_wind_speed, created_at, updated_at",
    )
    .bind(seed.id)
    .bind(&seed.city)
    .bind(seed.date)
    .bind(seed.average_temperature)
    .bind(seed.max_temperature)
    .bind(seed.min_temperature)
    .bind(&seed.dominant_weather)
    .bind(seed.average_humidity)
    .bind(seed.average_wind_speed)
    .bind(seed.created_at)
    .bind(seed.updated_at)
    .fetch_optional(conn)
    .await
}

/// Read the daily summary for `(city, date)` and hold a row lock on it until
/// the surrounding transaction ends.
pub async fn lock_daily_summary(
    conn: &mut PgConnection,
    city: &str,
    date: NaiveDate,
) -> Result<DailySummary, sqlx::Error> {
    sqlx::query_as::<_, DailySummary>(
        "SELECT id, city, date, average_temperature, max_temperature, min_temperature,
                dominant_weather, average_humidity, average_wind_speed, created_at, updated_at
         FROM daily_summaries
         WHERE city = $1 AND date = $2
         FOR UPDATE",
    )
    .bind(city)
    .bind(date)
    .fetch_one(conn)
    .await
}

/// Write back the mutable statistics of a daily summary.
pub async fn update_daily_summary(
    conn: &mut PgConnection,
    summary: &DailySummary,
) -> Result<DailySummary, sqlx::Error> {
    sqlx::query_as::<_, DailySummary>(
        "UPDATE daily_summaries
         SET average_temperature = $2,
             max_temperature = $3,
             min_temperature = $4,
             dominant_weather = $5,
             average_humidity = $6,
             average_wind_speed = $7,
             updated_at = $8
         WHERE id = $1
         RETURNING id, city, date, average_temperature, max_temperature, min_temperature,
                   dominant_weather, average_humidity, average_wind_speed, created_at, updated_at",
    )
    .bind(summary.id)
    .bind(summary.average_temperature)
    .bind(summary.max_temperature)
    .bind(summary.min_temperature)
    .bind(&summary.dominant_weather)
    .bind(summary.average_humidity)
    .bind(summary.average_wind_speed)
    .bind(summary.updated_at)
    .fetch_one(conn)
    .await
}

/// Get the most recent daily summary for a city.
pub async fn get_latest_daily_summary(
    pool: &PgPool,
    city: &str,
) -> Result<Option<DailySummary>, sqlx::Error> {
    sqlx::query_as::<_, DailySummary>(
        "SELECT id, city, date, average_temperature, max_temperature, min_temperature,
                dominant_weather, average_humidity, average_wind_speed, created_at, updated_at
         FROM daily_summaries
         WHERE city = $1
         ORDER BY date DESC
         LIMIT 1",
    )
    .bind(city)
    .fetch_optional(pool)
    .await
}

// ---------------------------------------------------------------------------
// Global summaries
// ---------------------------------------------------------------------------

/// Insert a freshly seeded global summary unless one already exists for its
/// date. Returns the inserted row, or `None` on conflict.
pub async fn insert_global_summary_if_absent(
    conn: &mut PgConnection,
    seed: &GlobalSummary,
) -> Result<Option<GlobalSummary>, sqlx::Error> {
    sqlx::query_as::<_, GlobalSummary>(
        "INSERT INTO global_summaries (
            id, date, max_temperature, max_temperature_city, min_temperature,
            min_temperature_city, average_temperature, dominant_weather, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (date) DO NOTHING
        RETURNING id, date, max_temperature, max_temperature_city, min_temperature,
                  min_temperature_city, average_temperature, dominant_weather,
                  created_at, updated_at",
    )
    .bind(seed.id)
    .bind(seed.date)
    .bind(seed.max_temperature)
    .bind(&seed.max_temperature_city)
    .bind(seed.min_temperature)
    .bind(&seed.min_temperature_city)
    .bind(seed.average_temperature)
    .bind(&seed.dominant_weather)
    .bind(seed.created_at)
    .bind(seed.updated_at)
    .fetch_optional(conn)
    .await
}

/// Read the global summary for `date` under a row lock.
pub async fn lock_global_summary(
    conn: &mut PgConnection,
    date: NaiveDate,
) -> Result<GlobalSummary, sqlx::Error> {
    sqlx::query_as::<_, GlobalSummary>(
        "SELECT id, date, max_temperature, max_temperature_city, min_temperature,
                min_temperature_city, average_temperature, dominant_weather,
                created_at, updated_at
         FROM global_summaries
         WHERE date = $1
         FOR UPDATE",
    )
    .bind(date)
    .fetch_one(conn)
    .await
}

/// Write back the mutable statistics of a global summary.
pub async fn update_global_summary(
    conn: &mut PgConnection,
    summary: &GlobalSummary,
) -> Result<GlobalSummary, sqlx::Error> {
    sqlx::query_as::<_, GlobalSummary>(
        "UPDATE global_summaries
         SET max_temperature = $2,
             max_temperature_city = $3,
             min_temperature = $4,
             min_temperature_city = $5,
             average_temperature = $6,
             dominant_weather = $7,
             updated_at = $8
         WHERE id = $1
         RETURNING id, date, max_temperature, max_temperature_city, min_temperature,
                   min_temperature_city, average_temperature, dominant_weather,
                   created_at, updated_at",
    )
    .bind(summary.id)
    .bind(summary.max_temperature)
    .bind(&summary.max_temperature_city)
    .bind(summary.min_temperature)
    .bind(&summary.min_temperature_city)
    .bind(summary.average_temperature)
    .bind(&summary.dominant_weather)
    .bind(summary.updated_at)
    .fetch_one(conn)
    .await
}

/// Get the most recent global summary.
pub async fn get_latest_global_summary(pool: &PgPool) -> Result<Option<GlobalSummary>, sqlx::Error> {
    sqlx::query_as::<_, GlobalSummary>(
        "SELECT id, date, max_temperature, max_temperature_city, min_temperature,
                min_temperature_city, average_temperature, dominant_weather,
                created_at, updated_at
         FROM global_summaries
         ORDER BY date DESC
         LIMIT 1",
    )
    .fetch_optional(pool)
    .await
}
