//! Dashboard API Module
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/dashboard/roles | GET | 角色列表 |
//! | /api/dashboard/catalog | GET | 组件目录 (可按 `role` 过滤) |
//! | /api/dashboard/configs/{role} | GET | 读取角色配置 |
//! | /api/dashboard/configs/{role} | PUT | 保存角色配置 |
//! | /api/dashboard/resolve | GET | 解析 `role` + `userId` 的权限 |

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/dashboard", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/roles", get(handler::list_roles))
        .route("/catalog", get(handler::catalog))
        .route("/configs/{role}", get(handler::get_config).put(handler::save_config))
        .route("/resolve", get(handler::resolve))
}
