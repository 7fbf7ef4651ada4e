//! Editor API Handlers
//!
//! Posted documents go through [`editor::open_document`], so one malformed
//! widget never blocks an edit.

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::Value;

use crate::core::ServerState;
use crate::editor::{self, MoveDirection};
use crate::utils::{AppError, AppResult};
use shared::models::{DashboardConfig, WidgetPatch, WidgetType};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRequest {
    config: Value,
    catalog_code: String,
    /// Defaults to the catalog family's type
    widget_type: Option<WidgetType>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    config: Value,
    widget_id: String,
    patch: WidgetPatch,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveRequest {
    config: Value,
    widget_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    config: Value,
    widget_id: String,
    direction: MoveDirection,
}

/// POST /api/dashboard/editor/add
pub async fn add(
    State(state): State<ServerState>,
    Json(req): Json<AddRequest>,
) -> AppResult<Json<DashboardConfig>> {
    let config = editor::open_document(req.config)?;
    let catalog = state.configs.get_catalog().await?;
    let (family, item) = catalog
        .find(&req.catalog_code)
        .ok_or_else(|| AppError::catalog_item_not_found(&req.catalog_code))?;

    if !item.available_to(&config.role) {
        return Err(AppError::permission_denied(format!(
            "Catalog item '{}' is not available to role '{}'",
            item.code, config.role
        )));
    }

    let widget_type = req.widget_type.unwrap_or(family.default_widget_type());
    Ok(Json(editor::add_widget_from_catalog(&config, item, widget_type)))
}

/// POST /api/dashboard/editor/update
pub async fn update(Json(req): Json<UpdateRequest>) -> AppResult<Json<DashboardConfig>> {
    let config = editor::open_document(req.config)?;
    Ok(Json(editor::update_widget(&config, &req.widget_id, &req.patch)))
}

/// POST /api/dashboard/editor/remove
pub async fn remove(Json(req): Json<RemoveRequest>) -> AppResult<Json<DashboardConfig>> {
    let config = editor::open_document(req.config)?;
    Ok(Json(editor::remove_widget(&config, &req.widget_id)))
}

/// POST /api/dashboard/editor/reorder
pub async fn reorder(Json(req): Json<ReorderRequest>) -> AppResult<Json<DashboardConfig>> {
    let config = editor::open_document(req.config)?;
    Ok(Json(editor::reorder_widget(&config, &req.widget_id, req.direction)))
}
