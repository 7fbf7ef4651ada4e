//! 工具模块
//!
//! - 日志初始化与清理 ([`logger`])

pub mod logger;

// Re-export unified error types from shared
pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
