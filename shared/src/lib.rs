//! Shared types for the dashboard engine
//!
//! Common types used across the workspace: the dashboard configuration
//! model, catalog entries, canonical widget data shapes, the unified
//! error system and the collaborator traits the engine talks to.

pub mod error;
pub mod models;
pub mod store;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use store::{ConfigStore, OverrideStore, WidgetBackend};
