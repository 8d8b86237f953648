//! Usage reading API endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::usage::{CreateUsageReading, UsageReading, UsageReadingQuery},
    services::usage::{parse_since, RecordedReading},
};

/// Record a usage reading
///
/// Affected usage-based schedules of the equipment are recomputed right away.
#[utoipa::path(
    post,
    path = "/usage-readings",
    tag = "usage",
    request_body = CreateUsageReading,
    responses(
        (status = 201, description = "Reading recorded", body = RecordedReading),
        (status = 422, description = "Invalid reading", body = crate::error::ErrorResponse)
    )
)]
pub async fn record_reading(
    State(state): State<crate::AppState>,
    Json(data): Json<CreateUsageReading>,
) -> AppResult<(StatusCode, Json<RecordedReading>)> {
    let recorded = state.services.usage.record_reading(data).await?;
    Ok((StatusCode::CREATED, Json(recorded)))
}

/// List the readings of one equipment meter
#[utoipa::path(
    get,
    path = "/equipment/{id}/usage-readings",
    tag = "usage",
    params(
        ("id" = Uuid, Path, description = "Equipment ID"),
        UsageReadingQuery
    ),
    responses(
        (status = 200, description = "Readings ordered by recorded_at", body = Vec<UsageReading>)
    )
)]
pub async fn list_readings(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<UsageReadingQuery>,
) -> AppResult<Json<Vec<UsageReading>>> {
    let since = parse_since(query.since.as_deref())?;
    let readings = state
        .services
        .usage
        .list_readings(id, query.metric, since)
        .await?;
    Ok(Json(readings))
}
