use std::sync::Arc;
use std::time::Duration;

use shared::store::{ConfigStore, OverrideStore, WidgetBackend};

use crate::core::Config;
use crate::core::config::StoreMode;
use crate::permission::PermissionResolver;
use crate::session::{DEFAULT_SESSION_IDLE_TTL, SessionRegistry};
use crate::store::MemoryStore;
use crate::widget_data::WidgetDataAdapter;

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc 实现浅拷贝，handler 之间共享。
///
/// | 字段 | 说明 |
/// |------|------|
/// | configs | 配置存储 (按角色) |
/// | resolver | 权限解析 |
/// | sessions | 会话注册表 (持有组件数据适配器) |
#[derive(Clone)]
pub struct ServerState {
    pub configs: Arc<dyn ConfigStore>,
    pub resolver: PermissionResolver,
    pub sessions: Arc<SessionRegistry>,
}

impl ServerState {
    /// 根据配置初始化服务器状态
    pub fn initialize(config: &Config) -> anyhow::Result<Self> {
        match config.store_mode {
            StoreMode::Http => {
                let client = Arc::new(config.client_config().build_http_client()?);
                tracing::info!(backend = %config.backend_url, "Using REST backend");
                Ok(Self::build(
                    client.clone(),
                    client.clone(),
                    client,
                    config.widget_fetch_timeout(),
                    config.session_idle_ttl(),
                ))
            }
            StoreMode::Memory => {
                tracing::warn!("Using in-memory stores, nothing will be persisted");
                let store = Arc::new(MemoryStore::new());
                Ok(Self::build(
                    store.clone(),
                    store.clone(),
                    store,
                    config.widget_fetch_timeout(),
                    config.session_idle_ttl(),
                ))
            }
        }
    }

    pub fn with_backends(
        configs: Arc<dyn ConfigStore>,
        overrides: Arc<dyn OverrideStore>,
        widgets: Arc<dyn WidgetBackend>,
        widget_timeout: Duration,
    ) -> Self {
        Self::build(configs, overrides, widgets, widget_timeout, DEFAULT_SESSION_IDLE_TTL)
    }

    fn build(
        configs: Arc<dyn ConfigStore>,
        overrides: Arc<dyn OverrideStore>,
        widgets: Arc<dyn WidgetBackend>,
        widget_timeout: Duration,
        session_idle_ttl: Duration,
    ) -> Self {
        let resolver = PermissionResolver::new(configs.clone(), overrides);
        let adapter = WidgetDataAdapter::new(widgets, widget_timeout);
        let sessions = Arc::new(SessionRegistry::new(resolver.clone(), adapter).with_idle_ttl(session_idle_ttl));
        Self {
            configs,
            resolver,
            sessions,
        }
    }

    /// All three collaborators served by one [`MemoryStore`]
    pub fn with_memory_store(store: Arc<MemoryStore>, widget_timeout: Duration) -> Self {
        Self::with_backends(store.clone(), store.clone(), store, widget_timeout)
    }
}
