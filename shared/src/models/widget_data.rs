//! Canonical widget data shapes
//!
//! Whatever envelope a widget backend answers with, the adapter reduces
//! it to one of these shapes before it reaches the renderer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::widget::TableColumn;

/// A single row/point/entry as delivered by the backend
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trend {
    pub value: f64,
    pub is_positive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
}

/// Headline number
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricData {
    pub value: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub data: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    pub columns: Vec<TableColumn>,
    pub rows: Vec<Record>,
}

/// Shared shape of task, approval, alert and activity widgets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Record>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alerts: Option<Vec<Record>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activities: Option<Vec<Record>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Record>>,
}

impl ListData {
    /// Entries regardless of which key carried them
    pub fn entries(&self) -> &[Record] {
        self.tasks
            .as_deref()
            .or(self.alerts.as_deref())
            .or(self.activities.as_deref())
            .or(self.items.as_deref())
            .unwrap_or(&[])
    }
}

/// Normalized data for one widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum WidgetData {
    Metric(MetricData),
    Chart(ChartData),
    Table(TableData),
    List(ListData),
    Custom(Value),
}
