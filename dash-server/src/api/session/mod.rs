//! Session API Module
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/dashboard/sessions/{id}/activate | POST | 第一阶段：解析菜单与组件可见性 |
//! | /api/dashboard/sessions/{id}/widgets | GET | 第二阶段：并发加载组件数据 |
//! | /api/dashboard/sessions/{id} | DELETE | 结束会话 |

mod handler;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/dashboard/sessions", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/{id}/activate", post(handler::activate))
        .route("/{id}/widgets", get(handler::widgets))
        .route("/{id}", delete(handler::close))
}
