//! Shared fixtures for dash-server integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use dash_server::{MemoryStore, ServerState};
use serde_json::{Value, json};
use shared::models::{Catalog, UserPermissionOverrides};

/// Operations dashboard: a KPI, an approval queue, a routes table and a menu
pub fn operations_doc() -> Value {
    json!({
        "role": "operations",
        "permissions": {
            "ROUTE_VIEW": true,
            "APPROVAL_VIEW": true,
            "APPROVAL_APPROVE": true,
            "REPORT_VIEW": false
        },
        "menuItems": [
            {"id": "home", "label": "Home", "path": "/", "iconKey": "home"},
            {"id": "masters", "label": "Masters", "path": "/masters", "children": [
                {"id": "routes", "label": "Routes", "path": "/masters/routes", "permission": "ROUTE_VIEW"},
                {"id": "contracts", "label": "Contracts", "path": "/masters/contracts", "permission": "CONTRACT_VIEW"}
            ]},
            {"id": "reports", "label": "Reports", "path": "/reports", "permission": "REPORT_VIEW"}
        ],
        "widgets": [
            {
                "id": "kpi-bins",
                "type": "metric",
                "title": "Bins collected",
                "gridColumn": 1,
                "props": {"format": "number"},
                "dataSource": {"endpoint": "/api/kpi/bins"}
            },
            {
                "id": "approvals",
                "type": "approval-queue",
                "title": "Pending approvals",
                "permissions": {"view": "APPROVAL_VIEW", "actions": {"approve": "APPROVAL_APPROVE"}},
                "dataSource": {"endpoint": "/api/approvals"}
            },
            {
                "id": "routes-table",
                "type": "table",
                "title": "Routes",
                "gridColumn": 4,
                "dataSource": {"endpoint": "/api/routes"}
            },
            {
                "id": "revenue",
                "type": "metric",
                "title": "Revenue",
                "permissions": {"view": "REPORT_VIEW"},
                "dataSource": {"endpoint": "/api/kpi/revenue"}
            }
        ]
    })
}

pub fn catalog() -> Catalog {
    serde_json::from_value(json!({
        "kpis": [
            {"code": "kpi-tonnage", "title": "Tonnage", "api": "/api/kpi/tonnage", "format": "number"},
            {"code": "kpi-revenue", "title": "Revenue", "api": "/api/kpi/revenue", "format": "currency", "roles": ["finance"]}
        ],
        "charts": [
            {"code": "chart-pickups", "title": "Pickups", "api": "/api/charts/pickups", "chartTypes": ["line", "bar"], "roles": ["operations"]}
        ],
        "tasks": [
            {"code": "task-mine", "title": "My tasks", "api": "/api/tasks/mine", "roles": ["all"]}
        ]
    }))
    .unwrap()
}

pub fn memory_store() -> MemoryStore {
    MemoryStore::new()
        .with_raw_config("operations", operations_doc())
        .with_overrides(
            UserPermissionOverrides::new("u-approver-lite")
                .with_permission("APPROVAL_APPROVE", false)
                .with_menu_override("home", false),
        )
        .with_catalog(catalog())
        .with_response("/api/kpi/bins", json!({"success": true, "data": {"value": 1280, "label": "Bins"}}))
        .with_response("/api/approvals", json!([{"id": "a1", "title": "Extra pickup"}]))
        .with_response("/api/routes", json!({"rows": [{"route": "R1", "stops": 42}]}))
}

pub fn state(store: Arc<MemoryStore>) -> ServerState {
    ServerState::with_memory_store(store, Duration::from_secs(2))
}
