//! Dash Server - 角色仪表盘配置与权限解析引擎
//!
//! # 架构概述
//!
//! - **权限解析** (`permission`): 角色配置 + 用户覆盖 → 权限表、菜单树、组件列表
//! - **配置编辑** (`editor`): 纯函数式的增删改排序
//! - **组件数据** (`widget_data`): 请求后端并归一化为五种标准形状
//! - **会话** (`session`): 两阶段渲染、代次与取消
//! - **HTTP API** (`api`): 面向渲染端的 axum 接口
//!
//! # 模块结构
//!
//! ```text
//! dash-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── permission/    # 解析器与菜单/组件过滤
//! ├── editor/        # 配置编辑器
//! ├── widget_data/   # 组件数据适配
//! ├── session/       # 会话与代次
//! ├── store/         # 内存存储
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 日志等工具
//! ```

pub mod api;
pub mod core;
pub mod editor;
pub mod permission;
pub mod session;
pub mod store;
pub mod utils;
pub mod widget_data;

// Re-export 公共类型
pub use crate::core::{Config, Server, ServerState};
pub use permission::PermissionResolver;
pub use session::{DashboardSession, SessionRegistry};
pub use store::MemoryStore;
pub use widget_data::WidgetDataAdapter;

pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

/// 加载 .env、读取配置并初始化日志
pub fn setup_environment() -> anyhow::Result<Config> {
    // .env is optional
    let _ = dotenv::dotenv();

    let config = Config::from_env();
    init_logger_with_file(&config.log_level, config.log_json, config.log_dir.as_deref())?;
    Ok(config)
}
