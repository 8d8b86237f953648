//! API handlers for the maintenance scheduling REST endpoints

pub mod health;
pub mod openapi;
pub mod schedules;
pub mod usage;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Usage readings
        .route("/usage-readings", post(usage::record_reading))
        .route("/equipment/:id/usage-readings", get(usage::list_readings))
        .route("/equipment/:id/recompute", post(schedules::recompute_equipment))
        // Schedules
        .route(
            "/schedules",
            get(schedules::list_schedules).post(schedules::create_schedule),
        )
        .route("/schedules/due", get(schedules::list_due))
        .route(
            "/schedules/:id",
            get(schedules::get_schedule).put(schedules::update_schedule),
        )
        .route("/schedules/:id/complete", post(schedules::complete_service))
        .route("/schedules/:id/cancel", post(schedules::cancel_schedule))
        .route(
            "/schedules/:id/lock",
            put(schedules::lock_service_date).delete(schedules::unlock_service_date),
        )
        .route("/schedules/:id/recompute", post(schedules::recompute_schedule))
        // Sweep
        .route("/sweep", post(schedules::run_sweep))
        .with_state(state);

    // OpenAPI documentation
    let openapi = openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
