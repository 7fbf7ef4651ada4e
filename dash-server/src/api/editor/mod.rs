//! Editor API Module
//!
//! Stateless wrappers over the configuration editor. Each endpoint takes
//! the current document and returns the edited one; nothing is saved.
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/dashboard/editor/add | POST | 从目录添加组件 |
//! | /api/dashboard/editor/update | POST | 更新组件 |
//! | /api/dashboard/editor/remove | POST | 删除组件 |
//! | /api/dashboard/editor/reorder | POST | 上移 / 下移组件 |

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/dashboard/editor", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/add", post(handler::add))
        .route("/update", post(handler::update))
        .route("/remove", post(handler::remove))
        .route("/reorder", post(handler::reorder))
}
