//! In-memory collaborator stores
//!
//! Backs local runs (`STORE_MODE=memory`) and the engine tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::RwLock;

use shared::error::{AppError, AppResult};
use shared::models::{Catalog, DashboardConfig, DataSource, Role, UserPermissionOverrides};
use shared::store::{ConfigStore, OverrideStore, WidgetBackend};

/// Configs, overrides, catalog and canned widget responses held in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    configs: DashMap<Role, Value>,
    overrides: DashMap<String, UserPermissionOverrides>,
    /// endpoint -> canned response
    responses: DashMap<String, AppResult<Value>>,
    catalog: RwLock<Catalog>,
    save_error: RwLock<Option<String>>,
    fetch_delay: Option<Duration>,
    fetches: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(self, config: DashboardConfig) -> Self {
        match serde_json::to_value(&config) {
            Ok(doc) => {
                self.configs.insert(config.role.clone(), doc);
            }
            Err(e) => {
                tracing::error!(role = %config.role, error = %e, "Failed to encode configuration");
            }
        }
        self
    }

    /// Store a document verbatim, malformed parts included
    pub fn with_raw_config(self, role: impl Into<Role>, doc: Value) -> Self {
        self.configs.insert(role.into(), doc);
        self
    }

    pub fn with_overrides(self, overrides: UserPermissionOverrides) -> Self {
        self.overrides.insert(overrides.user_id.clone(), overrides);
        self
    }

    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = RwLock::new(catalog);
        self
    }

    pub fn with_response(self, endpoint: impl Into<String>, body: Value) -> Self {
        self.responses.insert(endpoint.into(), Ok(body));
        self
    }

    pub fn with_failure(self, endpoint: impl Into<String>, error: AppError) -> Self {
        self.responses.insert(endpoint.into(), Err(error));
        self
    }

    /// Delay every widget fetch, for exercising cancellation
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    /// Make subsequent saves fail with `message` (`None` restores saving)
    pub async fn set_save_error(&self, message: Option<String>) {
        *self.save_error.write().await = message;
    }

    /// Number of widget fetches served so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    pub fn stored(&self, role: &Role) -> Option<Value> {
        self.configs.get(role).map(|doc| doc.value().clone())
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn get_config(&self, role: &Role) -> AppResult<Option<Value>> {
        Ok(self.stored(role))
    }

    async fn put_config(&self, config: &DashboardConfig) -> AppResult<()> {
        if let Some(message) = self.save_error.read().await.clone() {
            tracing::error!(role = %config.role, error = %message, "Failed to save dashboard configuration");
            return Err(AppError::config_save(message));
        }
        let doc = serde_json::to_value(config)
            .map_err(|e| AppError::config_save(format!("Failed to encode configuration: {}", e)))?;
        self.configs.insert(config.role.clone(), doc);
        Ok(())
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let mut roles: Vec<Role> = self.configs.iter().map(|entry| entry.key().clone()).collect();
        roles.sort();
        Ok(roles)
    }

    async fn get_catalog(&self) -> AppResult<Catalog> {
        Ok(self.catalog.read().await.clone())
    }
}

#[async_trait]
impl OverrideStore for MemoryStore {
    async fn get_overrides(&self, user_id: &str) -> AppResult<Option<UserPermissionOverrides>> {
        Ok(self.overrides.get(user_id).map(|o| o.value().clone()))
    }
}

#[async_trait]
impl WidgetBackend for MemoryStore {
    async fn fetch(&self, source: &DataSource) -> AppResult<Value> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        match self.responses.get(&source.endpoint) {
            Some(response) => response.value().clone(),
            None => Err(AppError::widget_fetch(format!("HTTP 404: no handler for {}", source.endpoint))
                .with_detail("endpoint", source.endpoint.clone())),
        }
    }
}
