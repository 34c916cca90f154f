use axum::extract::State;
use axum::Json;
use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;

use crate::services::scheduler::SharedSchedulerState;

/// State for the health endpoint.
#[derive(Clone)]
pub(crate) struct HealthState {
    pub(crate) pool: PgPool,
    pub(crate) scheduler: SharedSchedulerState,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status ("ok" when healthy, "degraded" when the DB is unreachable
    /// or the scheduler is not running)
    pub status: String,
    /// API version
    pub version: String,
    /// Whether the database is reachable
    pub database: bool,
    /// Whether the sampling scheduler is running
    pub scheduler: bool,
}

/// Health check endpoint.
///
/// Verifies database connectivity with a simple query and reports whether the
/// scheduler is running. Returns status "degraded" (still 200) on partial
/// failure so load balancers can tell the difference.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_check(State(state): State<HealthState>) -> Json<HealthResponse> {
    let db_ok = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.pool)
        .await
        .is_ok();
    let scheduler_ok = state.scheduler.read().await.active;

    Json(HealthResponse {
        status: overall_status(db_ok, scheduler_ok).to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_ok,
        scheduler: scheduler_ok,
    })
}

fn overall_status(db_ok: bool, scheduler_ok: bool) -> &'static str {
    if db_ok && scheduler_ok {
        "ok"
    } else {
        "degraded"
    }
}
