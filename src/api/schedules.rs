//! Maintenance schedule API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::schedule::{
        CompleteService, CreateSchedule, DueQuery, LockServiceDate, MaintenanceSchedule,
        ScheduleScope, UpdateSchedule,
    },
    services::sweep::SweepReport,
};

/// List schedules, optionally scoped to a shop or a piece of equipment
#[utoipa::path(
    get,
    path = "/schedules",
    tag = "schedules",
    params(ScheduleScope),
    responses(
        (status = 200, description = "Schedules ordered by next service date", body = Vec<MaintenanceSchedule>)
    )
)]
pub async fn list_schedules(
    State(state): State<crate::AppState>,
    Query(scope): Query<ScheduleScope>,
) -> AppResult<Json<Vec<MaintenanceSchedule>>> {
    let schedules = state.services.scheduling.list_schedules(&scope).await?;
    Ok(Json(schedules))
}

/// Get schedule by ID
#[utoipa::path(
    get,
    path = "/schedules/{id}",
    tag = "schedules",
    params(("id" = Uuid, Path, description = "Schedule ID")),
    responses(
        (status = 200, description = "Schedule details", body = MaintenanceSchedule),
        (status = 404, description = "Schedule not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_schedule(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MaintenanceSchedule>> {
    let schedule = state.services.scheduling.get_schedule(id).await?;
    Ok(Json(schedule))
}

/// Create schedule
#[utoipa::path(
    post,
    path = "/schedules",
    tag = "schedules",
    request_body = CreateSchedule,
    responses(
        (status = 201, description = "Schedule created", body = MaintenanceSchedule),
        (status = 422, description = "Inconsistent trigger configuration", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_schedule(
    State(state): State<crate::AppState>,
    Json(data): Json<CreateSchedule>,
) -> AppResult<(StatusCode, Json<MaintenanceSchedule>)> {
    let schedule = state.services.scheduling.create_schedule(data).await?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

/// Update schedule configuration
#[utoipa::path(
    put,
    path = "/schedules/{id}",
    tag = "schedules",
    params(("id" = Uuid, Path, description = "Schedule ID")),
    request_body = UpdateSchedule,
    responses(
        (status = 200, description = "Schedule updated", body = MaintenanceSchedule),
        (status = 409, description = "Schedule is cancelled", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_schedule(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateSchedule>,
) -> AppResult<Json<MaintenanceSchedule>> {
    let schedule = state.services.scheduling.update_schedule(id, data).await?;
    Ok(Json(schedule))
}

/// Record a completed service and start the next cycle
#[utoipa::path(
    post,
    path = "/schedules/{id}/complete",
    tag = "schedules",
    params(("id" = Uuid, Path, description = "Schedule ID")),
    request_body = CompleteService,
    responses(
        (status = 200, description = "Service recorded", body = MaintenanceSchedule),
        (status = 404, description = "Schedule not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Schedule is cancelled", body = crate::error::ErrorResponse)
    )
)]
pub async fn complete_service(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
    Json(data): Json<CompleteService>,
) -> AppResult<Json<MaintenanceSchedule>> {
    let schedule = state.services.scheduling.complete_service(id, data).await?;
    Ok(Json(schedule))
}

/// Cancel schedule
#[utoipa::path(
    post,
    path = "/schedules/{id}/cancel",
    tag = "schedules",
    params(("id" = Uuid, Path, description = "Schedule ID")),
    responses(
        (status = 200, description = "Schedule cancelled", body = MaintenanceSchedule)
    )
)]
pub async fn cancel_schedule(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MaintenanceSchedule>> {
    let schedule = state.services.scheduling.cancel_schedule(id).await?;
    Ok(Json(schedule))
}

/// Pin the service date
#[utoipa::path(
    put,
    path = "/schedules/{id}/lock",
    tag = "schedules",
    params(("id" = Uuid, Path, description = "Schedule ID")),
    request_body = LockServiceDate,
    responses(
        (status = 200, description = "Service date locked", body = MaintenanceSchedule)
    )
)]
pub async fn lock_service_date(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
    Json(data): Json<LockServiceDate>,
) -> AppResult<Json<MaintenanceSchedule>> {
    let schedule = state
        .services
        .scheduling
        .lock_service_date(id, data.locked_service_date)
        .await?;
    Ok(Json(schedule))
}

/// Remove the pinned service date
#[utoipa::path(
    delete,
    path = "/schedules/{id}/lock",
    tag = "schedules",
    params(("id" = Uuid, Path, description = "Schedule ID")),
    responses(
        (status = 200, description = "Service date unlocked", body = MaintenanceSchedule)
    )
)]
pub async fn unlock_service_date(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MaintenanceSchedule>> {
    let schedule = state.services.scheduling.unlock(id).await?;
    Ok(Json(schedule))
}

/// Recompute one schedule now
#[utoipa::path(
    post,
    path = "/schedules/{id}/recompute",
    tag = "schedules",
    params(("id" = Uuid, Path, description = "Schedule ID")),
    responses(
        (status = 200, description = "Recomputed schedule", body = MaintenanceSchedule)
    )
)]
pub async fn recompute_schedule(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MaintenanceSchedule>> {
    let schedule = state.services.scheduling.recompute_schedule(id).await?;
    Ok(Json(schedule))
}

/// Recompute every open schedule of a piece of equipment
#[utoipa::path(
    post,
    path = "/equipment/{id}/recompute",
    tag = "schedules",
    params(("id" = Uuid, Path, description = "Equipment ID")),
    responses(
        (status = 200, description = "Recomputed schedules", body = Vec<MaintenanceSchedule>)
    )
)]
pub async fn recompute_equipment(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<MaintenanceSchedule>>> {
    let schedules = state.services.scheduling.recompute(id).await?;
    Ok(Json(schedules))
}

/// List due work: `due_soon`, `overdue` or `needs_attention`
#[utoipa::path(
    get,
    path = "/schedules/due",
    tag = "schedules",
    params(DueQuery),
    responses(
        (status = 200, description = "Due schedules ordered by next service date", body = Vec<MaintenanceSchedule>)
    )
)]
pub async fn list_due(
    State(state): State<crate::AppState>,
    Query(query): Query<DueQuery>,
) -> AppResult<Json<Vec<MaintenanceSchedule>>> {
    let schedules = state
        .services
        .scheduling
        .list_due(query.filter, &query.scope())
        .await?;
    Ok(Json(schedules))
}

/// Run a sweep now instead of waiting for the next interval
#[utoipa::path(
    post,
    path = "/sweep",
    tag = "schedules",
    responses(
        (status = 200, description = "Sweep report", body = SweepReport)
    )
)]
pub async fn run_sweep(State(state): State<crate::AppState>) -> AppResult<Json<SweepReport>> {
    let report = state.services.scheduling.sweep().await?;
    Ok(Json(report))
}
