//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{health, schedules, usage};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ShopCare Maintenance API",
        version = "0.3.0",
        description = "Predictive equipment maintenance scheduling"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Usage
        usage::record_reading,
        usage::list_readings,
        // Schedules
        schedules::list_schedules,
        schedules::get_schedule,
        schedules::create_schedule,
        schedules::update_schedule,
        schedules::complete_service,
        schedules::cancel_schedule,
        schedules::lock_service_date,
        schedules::unlock_service_date,
        schedules::recompute_schedule,
        schedules::recompute_equipment,
        schedules::list_due,
        schedules::run_sweep,
    ),
    components(
        schemas(
            // Usage
            crate::models::UsageReading,
            crate::models::UsageMetric,
            crate::models::usage::CreateUsageReading,
            crate::services::usage::RecordedReading,
            // Schedules
            crate::models::MaintenanceSchedule,
            crate::models::TriggerType,
            crate::models::Priority,
            crate::models::ScheduleStatus,
            crate::models::DueFilter,
            crate::models::schedule::CreateSchedule,
            crate::models::schedule::UpdateSchedule,
            crate::models::schedule::CompleteService,
            crate::models::schedule::LockServiceDate,
            crate::services::sweep::SweepReport,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "usage", description = "Equipment usage readings"),
        (name = "schedules", description = "Maintenance schedules and due work")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
