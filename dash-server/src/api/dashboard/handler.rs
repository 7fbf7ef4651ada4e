//! Dashboard API Handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::Value;

use crate::core::ServerState;
use crate::editor::prepare_for_save;
use crate::utils::{AppError, AppResult};
use shared::models::{Catalog, ComputedPermissions, DashboardConfig, Role};

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveQuery {
    role: Option<String>,
    user_id: Option<String>,
}

/// GET /api/dashboard/roles
pub async fn list_roles(State(state): State<ServerState>) -> AppResult<Json<Vec<Role>>> {
    let roles = state.configs.list_roles().await?;
    Ok(Json(roles))
}

/// GET /api/dashboard/catalog?role=
pub async fn catalog(
    State(state): State<ServerState>,
    Query(query): Query<CatalogQuery>,
) -> AppResult<Json<Catalog>> {
    let catalog = state.configs.get_catalog().await?;
    let catalog = match query.role.filter(|r| !r.is_empty()) {
        Some(role) => catalog.for_role(&Role::from(role)),
        None => catalog,
    };
    Ok(Json(catalog))
}

/// GET /api/dashboard/configs/{role}
pub async fn get_config(
    State(state): State<ServerState>,
    Path(role): Path<String>,
) -> AppResult<Json<DashboardConfig>> {
    let config = state.resolver.load_config(&Role::from(role)).await?;
    Ok(Json(config))
}

/// PUT /api/dashboard/configs/{role} - explicit save
///
/// Malformed widgets and menu entries are dropped before saving; a
/// failed save surfaces the store's message.
pub async fn save_config(
    State(state): State<ServerState>,
    Path(role): Path<String>,
    Json(doc): Json<Value>,
) -> AppResult<Json<DashboardConfig>> {
    let role = Role::from(role);
    let config = prepare_for_save(&role, doc)?;
    state.configs.put_config(&config).await?;

    tracing::info!(role = %role, widgets = config.widgets.len(), "Dashboard configuration saved");
    Ok(Json(config))
}

/// GET /api/dashboard/resolve?role=&userId=
pub async fn resolve(
    State(state): State<ServerState>,
    Query(query): Query<ResolveQuery>,
) -> AppResult<Json<ComputedPermissions>> {
    let role = query
        .role
        .filter(|r| !r.is_empty())
        .map(Role::from)
        .ok_or_else(|| AppError::validation("Query parameter 'role' is required"))?;

    let computed = state.resolver.resolve(&role, query.user_id.as_deref()).await?;
    Ok(Json(computed))
}
