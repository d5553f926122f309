//! Service layer for the ladder service
//!
//! This module contains the application state, the role-checked ladder
//! facade and health reporting.

pub mod app;
pub mod health;
pub mod ladder;

pub use app::{AppState, ServiceError};
pub use health::{ComponentCheck, HealthCheck, HealthStatus, ServiceStats};
pub use ladder::LadderService;
