//! ShopCare predictive maintenance scheduling
//!
//! Decides when each piece of equipment is next due for service from
//! elapsed calendar time and accumulated usage, and classifies schedules
//! as `scheduled`, `due_soon` or `overdue` for dashboards and alerting.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod maintenance;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
