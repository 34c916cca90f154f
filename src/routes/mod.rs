pub mod health;
pub mod scheduler;
pub mod summaries;
pub mod weather;

use std::sync::Arc;

use crate::services::openweather::WeatherProvider;
use crate::services::store::SummaryStore;

/// Shared application state for weather and summary endpoints.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) store: Arc<dyn SummaryStore>,
    pub(crate) provider: Arc<dyn WeatherProvider>,
}
