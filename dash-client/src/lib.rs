//! Dash Client - HTTP client for the dashboard REST backend
//!
//! Implements the engine's collaborator traits over HTTP:
//! configuration persistence, per-user overrides and widget data
//! endpoints.

pub mod config;
pub mod error;
pub mod http;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;

// Re-export shared types for convenience
pub use shared::error::ApiResponse;
