//! 权限解析模块
//!
//! Merges a role's base configuration with per-user overrides and prunes
//! the menu tree and widget list accordingly.
//!
//! # 模块结构
//!
//! - [`resolver`] - `merge_permissions`, `apply_visibility_overrides`, [`PermissionResolver`]
//! - [`menu_filter`] - recursive menu pruning
//! - [`widget_filter`] - flat widget pruning and action-level checks

pub mod menu_filter;
pub mod resolver;
pub mod widget_filter;

pub use menu_filter::filter_menu;
pub use resolver::{PermissionResolver, apply_visibility_overrides, compute, merge_permissions};
pub use widget_filter::{can_perform, filter_widgets, is_widget_visible};

pub use shared::models::{ALL_PERMISSION, PermissionMap, is_granted};
