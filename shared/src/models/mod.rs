//! Data models
//!
//! Shared between dash-server, dash-client and the renderer (via API).
//! JSON field names are camelCase to match the backend documents.

pub mod catalog;
pub mod dashboard;
pub mod menu;
pub mod overrides;
pub mod permission;
pub mod role;
pub mod widget;
pub mod widget_data;

// Re-exports
pub use catalog::*;
pub use dashboard::*;
pub use menu::*;
pub use overrides::*;
pub use permission::*;
pub use role::*;
pub use widget::*;
pub use widget_data::*;
