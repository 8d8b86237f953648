//! Predictive maintenance computation
//!
//! Pure scheduling logic with no I/O: velocity estimation, trigger
//! evaluation, reconciliation and status classification. The services
//! layer feeds it store data and persists what it returns.

pub mod classify;
pub mod reconcile;
pub mod trigger;
pub mod velocity;

pub use classify::{classify, Classification};
pub use reconcile::{reconcile, ReconcileSettings, UsageSnapshot};
pub use trigger::{AbstainReason, UsageTrigger};
pub use velocity::VelocityEstimate;
