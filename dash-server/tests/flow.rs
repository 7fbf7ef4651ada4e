// dash-server/tests/flow.rs
// End to end: resolver, adapter and sessions over the real HTTP client

use std::sync::Arc;
use std::time::Duration;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use dash_client::{ClientConfig, HttpClient};
use dash_server::ServerState;
use dash_server::widget_data::{AdapterError, WidgetDataAdapter};
use serde_json::json;
use shared::error::ErrorCode;
use shared::models::{MetricData, MetricProps, Role, WidgetData};

async fn config(Path(role): Path<String>) -> impl IntoResponse {
    if role != "dispatch" {
        return (StatusCode::NOT_FOUND, "").into_response();
    }
    Json(json!({
        "success": true,
        "data": {
            "role": "dispatch",
            "permissions": {"DISPATCH_VIEW": true, "DISPATCH_ASSIGN": true},
            "menuItems": [{"id": "board", "label": "Board", "path": "/board", "permission": "DISPATCH_VIEW"}],
            "widgets": [
                {"id": "open-jobs", "type": "metric", "title": "Open jobs", "dataSource": {"endpoint": "/api/kpi/open"}},
                {"id": "late-jobs", "type": "metric", "title": "Late jobs", "dataSource": {"endpoint": "/api/kpi/broken"}},
                {"id": "crews", "type": "table", "title": "Crews", "dataSource": {"endpoint": "/api/kpi/broken"}},
                {
                    "id": "assign",
                    "type": "task-list",
                    "title": "Unassigned",
                    "permissions": {"view": "DISPATCH_VIEW", "actions": {"assign": "DISPATCH_ASSIGN"}},
                    "dataSource": {"endpoint": "/api/tasks/unassigned"}
                }
            ]
        }
    }))
    .into_response()
}

async fn overrides(Path(user_id): Path<String>) -> impl IntoResponse {
    if user_id != "u-trainee" {
        return (StatusCode::NOT_FOUND, "").into_response();
    }
    Json(json!({
        "code": 0,
        "message": "OK",
        "data": {
            "userId": "u-trainee",
            "permissions": {"DISPATCH_ASSIGN": false},
            "widgetOverrides": {"late-jobs": false}
        }
    }))
    .into_response()
}

async fn spawn_backend() -> String {
    let router = Router::new()
        .route("/api/dashboard/configs/{role}", get(config))
        .route("/api/users/{id}/permission-overrides", get(overrides))
        .route(
            "/api/kpi/open",
            get(|| async { Json(json!({"success": true, "data": {"data": {"count": "17", "label": "Open"}}})) }),
        )
        .route(
            "/api/kpi/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "<html>Internal Server Error</html>") }),
        )
        .route(
            "/api/tasks/unassigned",
            get(|| async { Json(json!([{"id": "t1", "title": "Bulky pickup"}])) }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn client() -> Arc<HttpClient> {
    let base_url = spawn_backend().await;
    Arc::new(
        ClientConfig::new(base_url)
            .with_timeout_ms(2_000)
            .build_http_client()
            .unwrap(),
    )
}

async fn state() -> ServerState {
    let client = client().await;
    ServerState::with_backends(client.clone(), client.clone(), client, Duration::from_secs(2))
}

#[tokio::test]
async fn test_resolve_over_http() {
    let state = state().await;
    let role = Role::from("dispatch");

    let computed = state.resolver.resolve(&role, None).await.unwrap();
    assert_eq!(computed.widgets.len(), 4);
    assert!(computed.can_perform("assign", "assign"));

    let computed = state.resolver.resolve(&role, Some("u-trainee")).await.unwrap();
    let ids: Vec<_> = computed.widgets.iter().map(|w| w.id.as_str()).collect();
    assert_eq!(ids, vec!["open-jobs", "crews", "assign"]);
    assert!(!computed.can_perform("assign", "assign"));
    assert_eq!(computed.menu_items.len(), 1);
}

#[tokio::test]
async fn test_unknown_role_and_user_fall_back() {
    let state = state().await;

    let config = state.resolver.load_config(&Role::from("nobody")).await.unwrap();
    assert!(config.widgets.is_empty());

    let computed = state
        .resolver
        .resolve(&Role::from("dispatch"), Some("u-unknown"))
        .await
        .unwrap();
    assert_eq!(computed.widgets.len(), 4);
}

#[tokio::test]
async fn test_adapter_failure_policy() {
    let client = client().await;
    let state = ServerState::with_backends(client.clone(), client.clone(), client.clone(), Duration::from_secs(2));
    let adapter = WidgetDataAdapter::new(client, Duration::from_secs(2));
    let config = state.resolver.load_config(&Role::from("dispatch")).await.unwrap();

    let open = config.widget("open-jobs").unwrap();
    let metric = adapter.metric(open, &MetricProps::default()).await;
    assert_eq!(metric.value, 17.0);
    assert_eq!(metric.label, "Open");

    // metric degrades to the default shape
    let late = config.widget("late-jobs").unwrap();
    let metric = adapter.metric(late, &MetricProps::default()).await;
    assert_eq!(metric, MetricData::default());

    // table surfaces the failure
    let crews = config.widget("crews").unwrap();
    let err = adapter.load(crews).await.unwrap_err();
    match err {
        AdapterError::Fetch(e) => {
            assert_eq!(e.code, ErrorCode::WidgetFetchFailed);
            assert!(e.message.contains("500"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_session_waves_over_http() {
    let state = state().await;
    let session = state.sessions.get_or_create("desk-1");

    let activation = session.activate(Role::from("dispatch"), None).await.unwrap();
    assert_eq!(activation.generation, 1);

    let wave = session.load_widgets().await.unwrap();
    assert!(!wave.superseded);
    assert_eq!(wave.widgets.len(), 4);

    let crews = wave.widgets.iter().find(|l| l.widget_id == "crews").unwrap();
    assert!(crews.data.is_none());
    assert_eq!(crews.error.as_ref().unwrap().code, ErrorCode::WidgetFetchFailed);

    let late = wave.widgets.iter().find(|l| l.widget_id == "late-jobs").unwrap();
    assert_eq!(late.data, Some(WidgetData::Metric(MetricData::default())));

    let tasks = wave.widgets.iter().find(|l| l.widget_id == "assign").unwrap();
    match tasks.data.as_ref().unwrap() {
        WidgetData::List(list) => assert_eq!(list.entries().len(), 1),
        other => panic!("unexpected data: {other:?}"),
    }

    // switching user bumps the generation
    let activation = session
        .activate(Role::from("dispatch"), Some("u-trainee".into()))
        .await
        .unwrap();
    assert_eq!(activation.generation, 2);
    let wave = session.load_widgets().await.unwrap();
    assert_eq!(wave.generation, 2);
    assert_eq!(wave.widgets.len(), 3);
}
