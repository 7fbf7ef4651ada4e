//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`dashboard`] - 角色、目录、配置读写与权限解析
//! - [`editor`] - 配置编辑 (无状态，不保存)
//! - [`session`] - 两阶段渲染会话

pub mod dashboard;
pub mod editor;
pub mod health;
pub mod session;

use axum::Router;

use crate::core::ServerState;

/// Full API router with state applied
pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(dashboard::router())
        .merge(editor::router())
        .merge(session::router())
        .with_state(state)
}
