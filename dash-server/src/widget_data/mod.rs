//! 组件数据适配
//!
//! - [`envelope`] - candidate payload probing
//! - [`normalize`] - pure payload → canonical shape reducers
//! - [`adapter`] - fetch + normalize, with the per-family failure policy

pub mod adapter;
pub mod envelope;
pub mod normalize;

pub use adapter::{AdapterError, WidgetDataAdapter};
pub use normalize::{normalize_chart, normalize_list, normalize_metric, normalize_table};
