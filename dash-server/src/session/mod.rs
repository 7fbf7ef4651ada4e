//! 仪表盘会话
//!
//! A session renders in two waves: [`DashboardSession::activate`] resolves
//! menu and widget visibility for a `(role, user)` pair, then
//! [`DashboardSession::load_widgets`] fetches data for every visible widget
//! concurrently. Each activation bumps the session generation and cancels
//! the previous wave's fetches; results tagged with an older generation
//! are discarded instead of applied.
//!
//! [`SessionRegistry`] drops sessions that stay idle longer than its TTL.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{ComputedPermissions, Role, WidgetData};

use crate::permission::PermissionResolver;
use crate::widget_data::WidgetDataAdapter;

/// Result of wave 1
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activation {
    pub generation: u64,
    pub computed: ComputedPermissions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetLoadError {
    pub code: ErrorCode,
    pub message: String,
}

/// Outcome of one widget fetch in wave 2
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetLoad {
    pub widget_id: String,
    pub generation: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<WidgetData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<WidgetLoadError>,
}

/// Result of wave 2
///
/// `superseded` is set when a newer activation happened while the wave
/// was in flight; `widgets` is then empty.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetWave {
    pub generation: u64,
    pub superseded: bool,
    pub widgets: Vec<WidgetLoad>,
}

#[derive(Debug)]
struct SessionInner {
    generation: u64,
    role: Option<Role>,
    user_id: Option<String>,
    computed: Option<ComputedPermissions>,
    cancel: CancellationToken,
}

/// Idle sessions are dropped after this long by default
pub const DEFAULT_SESSION_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

pub struct DashboardSession {
    id: String,
    resolver: PermissionResolver,
    adapter: WidgetDataAdapter,
    inner: RwLock<SessionInner>,
    /// Unix millis of the last activation or load
    last_active: AtomicI64,
}

impl DashboardSession {
    pub fn new(id: impl Into<String>, resolver: PermissionResolver, adapter: WidgetDataAdapter) -> Self {
        Self {
            id: id.into(),
            resolver,
            adapter,
            inner: RwLock::new(SessionInner {
                generation: 0,
                role: None,
                user_id: None,
                computed: None,
                cancel: CancellationToken::new(),
            }),
            last_active: AtomicI64::new(now_millis()),
        }
    }

    pub fn touch(&self) {
        self.last_active.store(now_millis(), Ordering::Relaxed);
    }

    /// Time since the last activation or load
    pub fn idle_for(&self) -> Duration {
        let idle = now_millis().saturating_sub(self.last_active.load(Ordering::Relaxed));
        Duration::from_millis(u64::try_from(idle).unwrap_or(0))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn generation(&self) -> u64 {
        self.inner.read().await.generation
    }

    pub async fn role(&self) -> Option<Role> {
        self.inner.read().await.role.clone()
    }

    pub async fn computed(&self) -> Option<ComputedPermissions> {
        self.inner.read().await.computed.clone()
    }

    /// Wave 1: resolve `(role, user)` and make it current
    ///
    /// Fails with [`ErrorCode::WidgetFetchCancelled`] if another activation
    /// started before this one finished resolving. A failed resolve leaves
    /// the session with no active dashboard.
    pub async fn activate(&self, role: Role, user_id: Option<String>) -> AppResult<Activation> {
        self.touch();
        let generation = {
            let mut inner = self.inner.write().await;
            inner.generation += 1;
            inner.cancel.cancel();
            inner.cancel = CancellationToken::new();
            inner.generation
        };

        let computed = match self.resolver.resolve(&role, user_id.as_deref()).await {
            Ok(computed) => computed,
            Err(e) => {
                let mut inner = self.inner.write().await;
                if inner.generation == generation {
                    inner.role = None;
                    inner.user_id = None;
                    inner.computed = None;
                }
                tracing::warn!(session_id = %self.id, role = %role, generation, error = %e, "Activation failed");
                return Err(e);
            }
        };

        let mut inner = self.inner.write().await;
        if inner.generation != generation {
            tracing::debug!(
                session_id = %self.id,
                generation,
                current = inner.generation,
                "Activation superseded before it completed"
            );
            return Err(AppError::with_message(
                ErrorCode::WidgetFetchCancelled,
                "Activation superseded by a newer one",
            ));
        }
        inner.role = Some(role.clone());
        inner.user_id = user_id;
        inner.computed = Some(computed.clone());

        tracing::info!(session_id = %self.id, role = %role, generation, "Dashboard activated");
        Ok(Activation { generation, computed })
    }

    /// Wave 2: fetch every visible widget of the current generation
    ///
    /// One widget's failure never affects its siblings.
    pub async fn load_widgets(&self) -> AppResult<WidgetWave> {
        self.touch();
        let (generation, widgets, cancel) = {
            let inner = self.inner.read().await;
            let Some(computed) = inner.computed.as_ref() else {
                return Err(AppError::invalid_request(format!(
                    "Session '{}' has no active dashboard",
                    self.id
                )));
            };
            (inner.generation, computed.widgets.clone(), inner.cancel.clone())
        };

        let fetches = widgets.iter().map(|widget| {
            let cancel = cancel.clone();
            async move {
                let outcome = tokio::select! {
                    _ = cancel.cancelled() => None,
                    result = self.adapter.load(widget) => Some(result),
                };
                (widget.id.clone(), outcome)
            }
        });
        let results = join_all(fetches).await;

        let current = self.generation().await;
        if current != generation {
            tracing::debug!(
                session_id = %self.id,
                generation,
                current,
                discarded = results.len(),
                "Discarding stale widget results"
            );
            return Ok(WidgetWave {
                generation,
                superseded: true,
                widgets: Vec::new(),
            });
        }

        let widgets = results
            .into_iter()
            .filter_map(|(widget_id, outcome)| {
                let outcome = outcome?;
                Some(match outcome {
                    Ok(data) => WidgetLoad {
                        widget_id,
                        generation,
                        data: Some(data),
                        error: None,
                    },
                    Err(e) => {
                        let e = AppError::from(e);
                        tracing::warn!(session_id = %self.id, widget_id = %widget_id, error = %e, "Widget load failed");
                        WidgetLoad {
                            widget_id,
                            generation,
                            data: None,
                            error: Some(WidgetLoadError {
                                code: e.code,
                                message: e.message,
                            }),
                        }
                    }
                })
            })
            .collect();

        Ok(WidgetWave {
            generation,
            superseded: false,
            widgets,
        })
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Live sessions by id
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<DashboardSession>>,
    resolver: PermissionResolver,
    adapter: WidgetDataAdapter,
    idle_ttl: Duration,
}

impl SessionRegistry {
    pub fn new(resolver: PermissionResolver, adapter: WidgetDataAdapter) -> Self {
        Self {
            sessions: DashMap::new(),
            resolver,
            adapter,
            idle_ttl: DEFAULT_SESSION_IDLE_TTL,
        }
    }

    pub fn with_idle_ttl(mut self, idle_ttl: Duration) -> Self {
        self.idle_ttl = idle_ttl;
        self
    }

    pub fn idle_ttl(&self) -> Duration {
        self.idle_ttl
    }

    pub fn get(&self, id: &str) -> Option<Arc<DashboardSession>> {
        let session = self.sessions.get(id).map(|s| s.value().clone())?;
        session.touch();
        Some(session)
    }

    pub fn get_or_create(&self, id: &str) -> Arc<DashboardSession> {
        let session = self
            .sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                tracing::debug!(session_id = %id, "Creating dashboard session");
                Arc::new(DashboardSession::new(id, self.resolver.clone(), self.adapter.clone()))
            })
            .value()
            .clone();
        session.touch();
        session
    }

    pub fn remove(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop sessions idle for longer than the TTL, returning how many went
    pub fn sweep_idle(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|id, session| {
            let keep = session.idle_for() <= self.idle_ttl;
            if !keep {
                tracing::debug!(session_id = %id, "Dropping idle dashboard session");
            }
            keep
        });
        before.saturating_sub(self.sessions.len())
    }

    /// Sweep idle sessions every `every` until `shutdown` fires
    pub fn spawn_sweeper(self: Arc<Self>, every: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::debug!("Session sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let dropped = self.sweep_idle();
                        if dropped > 0 {
                            tracing::info!(dropped, remaining = self.len(), "Expired idle dashboard sessions");
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;
    use shared::models::{DashboardConfig, DataSource, WidgetConfig, WidgetKind, WidgetType};

    fn config() -> DashboardConfig {
        let mut config = DashboardConfig::empty(Role::from("operations"));
        config.widgets = vec![
            WidgetConfig::new("kpi", "Bins", WidgetKind::default_for(WidgetType::Metric))
                .with_data_source(DataSource::get("/api/kpi/bins")),
            WidgetConfig::new("alerts", "Alerts", WidgetKind::default_for(WidgetType::Alert))
                .with_data_source(DataSource::get("/api/alerts")),
            WidgetConfig::new("routes", "Routes", WidgetKind::default_for(WidgetType::Table))
                .with_data_source(DataSource::get("/api/routes")),
        ];
        config
    }

    fn session(store: MemoryStore) -> (Arc<MemoryStore>, DashboardSession) {
        let store = Arc::new(store);
        let resolver = PermissionResolver::new(store.clone(), store.clone());
        let adapter = WidgetDataAdapter::new(store.clone(), Duration::from_secs(5));
        (store, DashboardSession::new("s1", resolver, adapter))
    }

    fn base_store() -> MemoryStore {
        MemoryStore::new()
            .with_config(config())
            .with_response("/api/kpi/bins", json!({"value": 12}))
            .with_response("/api/alerts", json!([{"msg": "late"}]))
            .with_failure("/api/routes", AppError::widget_fetch("HTTP 503: down"))
    }

    #[tokio::test]
    async fn test_load_before_activate_fails() {
        let (_, session) = session(base_store());
        assert!(session.load_widgets().await.is_err());
    }

    #[tokio::test]
    async fn test_failure_isolated_to_one_widget() {
        let (_, session) = session(base_store());
        let activation = session.activate(Role::from("operations"), None).await.unwrap();
        assert_eq!(activation.generation, 1);

        let wave = session.load_widgets().await.unwrap();
        assert!(!wave.superseded);
        assert_eq!(wave.widgets.len(), 3);

        let by_id = |id: &str| wave.widgets.iter().find(|w| w.widget_id == id).unwrap();
        assert!(by_id("kpi").data.is_some());
        assert!(by_id("alerts").data.is_some());
        let routes = by_id("routes");
        assert!(routes.data.is_none());
        assert_eq!(routes.error.as_ref().unwrap().code, ErrorCode::WidgetFetchFailed);
    }

    #[tokio::test]
    async fn test_reactivation_discards_in_flight_wave() {
        let (_, session) = session(base_store().with_fetch_delay(Duration::from_millis(300)));
        let session = Arc::new(session);
        session.activate(Role::from("operations"), None).await.unwrap();

        let loader = {
            let session = session.clone();
            tokio::spawn(async move { session.load_widgets().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = session.activate(Role::from("operations"), None).await.unwrap();
        assert_eq!(second.generation, 2);

        let stale = loader.await.unwrap().unwrap();
        assert!(stale.superseded);
        assert_eq!(stale.generation, 1);
        assert!(stale.widgets.is_empty());

        let fresh = session.load_widgets().await.unwrap();
        assert_eq!(fresh.generation, 2);
        assert!(fresh.widgets.iter().all(|w| w.generation == 2));
    }

    #[tokio::test]
    async fn test_registry_reuses_sessions() {
        let store = Arc::new(base_store());
        let registry = SessionRegistry::new(
            PermissionResolver::new(store.clone(), store.clone()),
            WidgetDataAdapter::new(store, Duration::from_secs(1)),
        );
        let a = registry.get_or_create("abc");
        let b = registry.get_or_create("abc");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
        assert!(registry.remove("abc"));
        assert!(registry.get("abc").is_none());
    }

    #[tokio::test]
    async fn test_failed_activation_clears_previous_dashboard() {
        let (_, session) = session(base_store().with_raw_config("finance", json!([1, 2])));
        session.activate(Role::from("operations"), None).await.unwrap();

        let err = session.activate(Role::from("finance"), None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigMalformed);
        assert_eq!(session.generation().await, 2);
        assert!(session.role().await.is_none());
        assert!(session.computed().await.is_none());

        let err = session.load_widgets().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRequest);

        let recovered = session.activate(Role::from("operations"), None).await.unwrap();
        assert_eq!(recovered.generation, 3);
        assert_eq!(session.load_widgets().await.unwrap().generation, 3);
    }

    fn registry(idle_ttl: Duration) -> Arc<SessionRegistry> {
        let store = Arc::new(base_store());
        Arc::new(
            SessionRegistry::new(
                PermissionResolver::new(store.clone(), store.clone()),
                WidgetDataAdapter::new(store, Duration::from_secs(1)),
            )
            .with_idle_ttl(idle_ttl),
        )
    }

    #[tokio::test]
    async fn test_sweep_drops_only_idle_sessions() {
        let registry = registry(Duration::from_millis(40));
        registry.get_or_create("stale");
        tokio::time::sleep(Duration::from_millis(80)).await;
        let fresh = registry.get_or_create("fresh");
        fresh.activate(Role::from("operations"), None).await.unwrap();

        assert_eq!(registry.sweep_idle(), 1);
        assert!(registry.get("stale").is_none());
        assert!(registry.get("fresh").is_some());
    }

    #[tokio::test]
    async fn test_sweeper_task_expires_and_stops() {
        let registry = registry(Duration::from_millis(20));
        registry.get_or_create("a");
        registry.get_or_create("b");

        let shutdown = CancellationToken::new();
        let handle = registry.clone().spawn_sweeper(Duration::from_millis(10), shutdown.clone());
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(registry.is_empty());

        shutdown.cancel();
        handle.await.unwrap();
    }
}
