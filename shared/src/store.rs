//! Collaborator traits
//!
//! The engine never talks to the backend directly; it goes through these
//! three seams. `dash-client` implements them over HTTP, and the server
//! ships an in-memory implementation for tests and local runs.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AppResult;
use crate::models::{Catalog, DashboardConfig, DataSource, Role, UserPermissionOverrides};

/// Keyed get/put store for dashboard configurations
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Raw stored document for `role`, `None` when nothing is stored
    ///
    /// Returned unparsed so the caller can apply
    /// [`DashboardConfig::from_stored`] and keep the valid parts of a
    /// damaged document.
    async fn get_config(&self, role: &Role) -> AppResult<Option<Value>>;

    async fn put_config(&self, config: &DashboardConfig) -> AppResult<()>;

    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    async fn get_catalog(&self) -> AppResult<Catalog>;
}

/// Source of per-user permission/visibility exceptions
#[async_trait]
pub trait OverrideStore: Send + Sync {
    async fn get_overrides(&self, user_id: &str) -> AppResult<Option<UserPermissionOverrides>>;
}

/// Widget data endpoints
#[async_trait]
pub trait WidgetBackend: Send + Sync {
    /// Issue the request described by `source` and return the JSON body
    ///
    /// Non-success statuses and non-JSON bodies are errors.
    async fn fetch(&self, source: &DataSource) -> AppResult<Value>;
}
