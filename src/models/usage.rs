//! Equipment usage reading model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::enums::UsageMetric;
use crate::error::AppError;

/// One observation of an equipment meter (append-only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UsageReading {
    pub id: Uuid,
    pub equipment_id: Uuid,
    pub reading_type: UsageMetric,
    /// Meter value (hours, kilometers or miles)
    pub reading_value: f64,
    /// When the reading was taken in the field
    pub recorded_at: DateTime<Utc>,
    /// Free-form source tag, e.g. "pre-trip" or "work-order"
    pub operation_type: Option<String>,
    /// When the reading was ingested
    pub created_at: DateTime<Utc>,
}

/// Record usage reading request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUsageReading {
    pub equipment_id: Uuid,
    pub reading_type: UsageMetric,
    #[validate(range(min = 0.0, message = "reading_value must not be negative"))]
    pub reading_value: f64,
    pub recorded_at: DateTime<Utc>,
    /// Free-form tag, stored as given
    pub operation_type: Option<String>,
}

/// Query parameters for listing readings of one equipment
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct UsageReadingQuery {
    /// Meter to list
    pub metric: UsageMetric,
    /// Only readings recorded on or after this date (YYYY-MM-DD)
    pub since: Option<String>,
}

/// Database row for `usage_readings`
#[derive(Debug, FromRow)]
pub struct UsageReadingRow {
    pub id: Uuid,
    pub equipment_id: Uuid,
    pub reading_type: String,
    pub reading_value: f64,
    pub recorded_at: DateTime<Utc>,
    pub operation_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UsageReadingRow> for UsageReading {
    type Error = AppError;

    fn try_from(row: UsageReadingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            equipment_id: row.equipment_id,
            reading_type: row.reading_type.parse()?,
            reading_value: row.reading_value,
            recorded_at: row.recorded_at,
            operation_type: row.operation_type,
            created_at: row.created_at,
        })
    }
}
