//! Service layer for the prestige-check voting service
//!
//! This module contains the main application state, the HTTP API,
//! and background task management for the production service.

pub mod app;
pub mod health;
pub mod routes;

pub use app::AppState;
pub use health::{HealthCheck, HealthStatus};
pub use routes::build_router;
