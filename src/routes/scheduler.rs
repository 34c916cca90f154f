//! Scheduler status HTTP endpoint.
//!
//! GET /api/v1/scheduler/status returns the current state of the background
//! sampling scheduler as JSON.

use axum::extract::State;
use axum::Json;

use crate::services::scheduler::{SchedulerState, SharedSchedulerState};

/// Get the current scheduler status.
///
/// Returns timer info (active, interval_secs, next_round_at), timing of the
/// last round, and its report (unavailable locations, daily update counts,
/// global result).
#[utoipa::path(
    get,
    path = "/api/v1/scheduler/status",
    tag = "Scheduler",
    responses(
        (status = 200, description = "Current scheduler status", body = SchedulerState),
    )
)]
pub async fn get_scheduler_status(
    State(state): State<SharedSchedulerState>,
) -> Json<SchedulerState> {
    let s = state.read().await;
    Json(s.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    #[tokio::test]
    async fn test_get_scheduler_status_snapshot() {
        let state: SharedSchedulerState = Arc::new(RwLock::new(SchedulerState::new(vec![
            "Delhi".to_string(),
        ])));
        state.write().await.total_rounds = 7;

        let Json(body) = get_scheduler_status(State(state)).await;

        assert_eq!(body.total_rounds, 7);
        assert_eq!(body.cities, vec!["Delhi".to_string()]);
        assert!(!body.active);
    }
}
