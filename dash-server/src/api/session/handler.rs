//! Session API Handlers

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;

use crate::core::ServerState;
use crate::session::{Activation, WidgetWave};
use crate::utils::{AppError, AppResult};
use shared::error::ApiResponse;
use shared::models::Role;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateRequest {
    role: Role,
    user_id: Option<String>,
}

/// POST /api/dashboard/sessions/{id}/activate
pub async fn activate(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<ActivateRequest>,
) -> AppResult<Json<Activation>> {
    let session = state.sessions.get_or_create(&id);
    let activation = session.activate(req.role, req.user_id).await?;
    Ok(Json(activation))
}

/// GET /api/dashboard/sessions/{id}/widgets
pub async fn widgets(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<WidgetWave>> {
    let session = state
        .sessions
        .get(&id)
        .ok_or_else(|| AppError::not_found(format!("Session {}", id)))?;
    let wave = session.load_widgets().await?;
    Ok(Json(wave))
}

/// DELETE /api/dashboard/sessions/{id}
pub async fn close(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    if !state.sessions.remove(&id) {
        return Err(AppError::not_found(format!("Session {}", id)));
    }
    tracing::debug!(session_id = %id, "Dashboard session closed");
    Ok(ApiResponse::ok())
}
