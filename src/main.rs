// Weather Summary API v0.1
use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod db;
mod errors;
mod helpers;
mod routes;
mod services;

use config::AppConfig;
use routes::health::HealthState;
use routes::AppState;
use services::openweather::OpenWeatherClient;
use services::scheduler::Scheduler;
use services::store::PgSummaryStore;

/// Maximum number of connections in the database pool.
const DB_POOL_MAX_CONNECTIONS: u32 = 10;
/// Minimum number of connections kept alive in the database pool.
const DB_POOL_MIN_CONNECTIONS: u32 = 2;

/// Weather Summary API OpenAPI document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Weather Summary API",
        version = "0.1.0",
        description = "Samples current weather for a fixed set of cities on a schedule and \
            keeps a running daily summary per city plus a cross-city global summary \
            for each UTC calendar day.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Weather", description = "Current weather straight from the provider"),
        (name = "Summaries", description = "Per-city and global daily summaries"),
        (name = "Scheduler", description = "Background sampling scheduler status"),
    ),
    paths(
        routes::health::health_check,
        routes::weather::get_current_weather,
        routes::summaries::get_daily_summary,
        routes::summaries::get_global_summary,
        routes::scheduler::get_scheduler_status,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            routes::weather::CurrentWeatherResponse,
            routes::summaries::DailySummaryResponse,
            routes::summaries::GlobalSummaryResponse,
            services::scheduler::SchedulerState,
            services::scheduler::RoundReport,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "weather_summary_api=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // Set up database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(DB_POOL_MAX_CONNECTIONS)
        .min_connections(DB_POOL_MIN_CONNECTIONS)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    if config.cities.is_empty() {
        tracing::warn!("WEATHER_CITIES is empty; scheduled rounds will sample nothing");
    }

    let provider = Arc::new(OpenWeatherClient::new(
        &config.openweather_api_key,
        &config.openweather_base_url,
        Duration::from_secs(config.provider_timeout_secs),
    ));
    let store = Arc::new(PgSummaryStore::new(pool.clone()));

    // Build shared application state
    let app_state = AppState {
        store: store.clone(),
        provider: provider.clone(),
    };

    // Start the background sampling scheduler
    let scheduler = Scheduler::new(provider, store, config.cities.clone());
    let scheduler_state = scheduler.state();
    let scheduler_handle =
        scheduler.start(Duration::from_secs(config.sampling_interval_secs));

    // CORS: read-only API, restrict methods to GET
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET])
        .allow_headers(Any);

    // Build router
    let data_routes = Router::new()
        .route(
            "/api/v1/weather/:city",
            get(routes::weather::get_current_weather),
        )
        .route(
            "/api/v1/summaries/daily/:city",
            get(routes::summaries::get_daily_summary),
        )
        .route(
            "/api/v1/summaries/global",
            get(routes::summaries::get_global_summary),
        )
        .with_state(app_state);

    let health_routes = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .with_state(HealthState {
            pool,
            scheduler: scheduler_state.clone(),
        });

    let scheduler_routes = Router::new()
        .route(
            "/api/v1/scheduler/status",
            get(routes::scheduler::get_scheduler_status),
        )
        .with_state(scheduler_state);

    let app = Router::new()
        .merge(health_routes)
        .merge(data_routes)
        .merge(scheduler_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server terminated unexpectedly");

    scheduler_handle.stop().await;
    tracing::info!("Shutdown complete");
}

/// Resolve on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
