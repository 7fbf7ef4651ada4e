//! Widget Model
//!
//! A widget's type-specific settings are a closed sum ([`WidgetKind`])
//! instead of an open property bag. On the wire the document keeps the
//! backend's `{type, props}` pair; [`RawWidgetConfig`] bridges the two.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Widget type as stored in configuration documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetType {
    Metric,
    Chart,
    Table,
    TaskList,
    ApprovalQueue,
    Alert,
    ActivityTimeline,
    Custom,
}

impl WidgetType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Chart => "chart",
            Self::Table => "table",
            Self::TaskList => "task-list",
            Self::ApprovalQueue => "approval-queue",
            Self::Alert => "alert",
            Self::ActivityTimeline => "activity-timeline",
            Self::Custom => "custom",
        }
    }
}

// ========== Grid size ==========

/// Legacy 4-unit width: quarter, half or full
///
/// Out-of-range input is clamped, never rejected: `<= 1` is quarter,
/// `2` is half, `>= 3` is full. Numeric strings and floats are accepted
/// and `null` reads as the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "u8")]
pub enum GridSize {
    Quarter = 1,
    #[default]
    Half = 2,
    Full = 4,
}

impl GridSize {
    pub fn clamped(raw: i64) -> Self {
        match raw {
            i64::MIN..=1 => Self::Quarter,
            2 => Self::Half,
            _ => Self::Full,
        }
    }

    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Span on the 12-column grid
    pub fn span(self) -> u8 {
        grid_span(i64::from(self.value()))
    }
}

impl From<i64> for GridSize {
    fn from(raw: i64) -> Self {
        let size = Self::clamped(raw);
        if i64::from(size.value()) != raw {
            tracing::warn!(raw, clamped = size.value(), "Widget size out of range, clamped");
        }
        size
    }
}

impl TryFrom<Value> for GridSize {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        if value.is_null() {
            return Ok(Self::default());
        }
        coerce_grid_value(&value)
            .map(Self::from)
            .ok_or_else(|| format!("invalid grid size: {}", value))
    }
}

/// Read a raw size from an integer, a float or a numeric string
pub fn coerce_grid_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.round() as i64))
        }
        _ => None,
    }
}

impl From<GridSize> for u8 {
    fn from(size: GridSize) -> Self {
        size.value()
    }
}

/// Map a legacy 4-unit width onto the 12-column grid: `clamp(1, 12, v * 3)`
pub fn grid_span(legacy: i64) -> u8 {
    legacy.saturating_mul(3).clamp(1, 12) as u8
}

// ========== Permissions & data source ==========

/// Per-widget permission codes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetPermissions {
    /// Code required to see the widget at all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    /// action name (`approve`, `edit`, ...) -> permission code
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub actions: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    #[serde(alias = "get")]
    Get,
    #[serde(alias = "post")]
    Post,
}

/// Where a widget loads its data from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    pub endpoint: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
    /// Refresh interval in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_interval: Option<u64>,
}

impl DataSource {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method: HttpMethod::Get,
            params: None,
            refresh_interval: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    #[serde(rename = "type")]
    pub chart_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<Vec<String>>,
}

impl ChartConfig {
    pub fn of_type(chart_type: impl Into<String>) -> Self {
        Self {
            chart_type: chart_type.into(),
            x_axis: None,
            y_axis: None,
            series: None,
        }
    }
}

// ========== Typed props ==========

/// Number formatting for metric widgets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricFormat {
    Number,
    Currency,
    Percent,
    #[serde(other)]
    Plain,
}

impl MetricFormat {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "number" => Self::Number,
            "currency" => Self::Currency,
            "percent" | "percentage" => Self::Percent,
            _ => Self::Plain,
        }
    }

    /// Unit shown when the payload carries none
    pub fn default_unit(&self) -> &'static str {
        match self {
            Self::Currency => "$",
            Self::Percent => "%",
            Self::Number | Self::Plain => "",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetricProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<MetricFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub show_trend: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChartProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub stacked: bool,
    pub hide_legend: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumn {
    pub key: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    /// Preset columns; when absent the adapter uses the payload's
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<TableColumn>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
    pub show_timestamps: bool,
}

/// The four list-shaped widget types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    TaskList,
    ApprovalQueue,
    Alert,
    ActivityTimeline,
}

impl ListKind {
    pub const fn widget_type(&self) -> WidgetType {
        match self {
            Self::TaskList => WidgetType::TaskList,
            Self::ApprovalQueue => WidgetType::ApprovalQueue,
            Self::Alert => WidgetType::Alert,
            Self::ActivityTimeline => WidgetType::ActivityTimeline,
        }
    }
}

/// Widget kind with its typed settings (五类组件)
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetKind {
    Metric(MetricProps),
    Chart(ChartProps),
    Table(TableProps),
    List(ListKind, ListProps),
    Custom(Map<String, Value>),
}

impl WidgetKind {
    pub fn default_for(widget_type: WidgetType) -> Self {
        match widget_type {
            WidgetType::Metric => Self::Metric(MetricProps::default()),
            WidgetType::Chart => Self::Chart(ChartProps::default()),
            WidgetType::Table => Self::Table(TableProps::default()),
            WidgetType::TaskList => Self::List(ListKind::TaskList, ListProps::default()),
            WidgetType::ApprovalQueue => Self::List(ListKind::ApprovalQueue, ListProps::default()),
            WidgetType::Alert => Self::List(ListKind::Alert, ListProps::default()),
            WidgetType::ActivityTimeline => {
                Self::List(ListKind::ActivityTimeline, ListProps::default())
            }
            WidgetType::Custom => Self::Custom(Map::new()),
        }
    }

    pub fn widget_type(&self) -> WidgetType {
        match self {
            Self::Metric(_) => WidgetType::Metric,
            Self::Chart(_) => WidgetType::Chart,
            Self::Table(_) => WidgetType::Table,
            Self::List(kind, _) => kind.widget_type(),
            Self::Custom(_) => WidgetType::Custom,
        }
    }

    /// Parse a stored `props` value for the given type
    pub fn from_props(widget_type: WidgetType, props: Option<Value>) -> serde_json::Result<Self> {
        let props = match props {
            None | Some(Value::Null) => return Ok(Self::default_for(widget_type)),
            Some(props) => props,
        };
        let kind = match Self::default_for(widget_type) {
            Self::Metric(_) => Self::Metric(serde_json::from_value(props)?),
            Self::Chart(_) => Self::Chart(serde_json::from_value(props)?),
            Self::Table(_) => Self::Table(serde_json::from_value(props)?),
            Self::List(kind, _) => Self::List(kind, serde_json::from_value(props)?),
            Self::Custom(_) => Self::Custom(serde_json::from_value(props)?),
        };
        Ok(kind)
    }

    /// Stored `props` value; `None` when every setting is at its default
    pub fn props_value(&self) -> Option<Value> {
        if *self == Self::default_for(self.widget_type()) {
            return None;
        }
        let value = match self {
            Self::Metric(p) => serde_json::to_value(p),
            Self::Chart(p) => serde_json::to_value(p),
            Self::Table(p) => serde_json::to_value(p),
            Self::List(_, p) => serde_json::to_value(p),
            Self::Custom(map) => Ok(Value::Object(map.clone())),
        };
        value.ok()
    }
}

// ========== Widget ==========

/// Widget entry in a dashboard configuration (仪表盘组件)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWidgetConfig", into = "RawWidgetConfig")]
pub struct WidgetConfig {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub grid_column: GridSize,
    pub grid_row: Option<u8>,
    pub permissions: Option<WidgetPermissions>,
    pub kind: WidgetKind,
    pub data_source: Option<DataSource>,
    pub chart_config: Option<ChartConfig>,
}

impl WidgetConfig {
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: WidgetKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            grid_column: GridSize::default(),
            grid_row: None,
            permissions: None,
            kind,
            data_source: None,
            chart_config: None,
        }
    }

    pub fn widget_type(&self) -> WidgetType {
        self.kind.widget_type()
    }

    /// Code gating visibility, if any
    pub fn view_permission(&self) -> Option<&str> {
        self.permissions.as_ref()?.view.as_deref()
    }

    /// Code gating `action`, if any
    pub fn action_permission(&self, action: &str) -> Option<&str> {
        self.permissions
            .as_ref()?
            .actions
            .get(action)
            .map(String::as_str)
    }

    pub fn with_view_permission(mut self, code: impl Into<String>) -> Self {
        self.permissions.get_or_insert_with(Default::default).view = Some(code.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>, code: impl Into<String>) -> Self {
        self.permissions
            .get_or_insert_with(Default::default)
            .actions
            .insert(action.into(), code.into());
        self
    }

    pub fn with_data_source(mut self, source: DataSource) -> Self {
        self.data_source = Some(source);
        self
    }
}

/// Wire form of [`WidgetConfig`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWidgetConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub widget_type: WidgetType,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub grid_column: GridSize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_row: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<WidgetPermissions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub props: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<DataSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_config: Option<ChartConfig>,
}

impl TryFrom<RawWidgetConfig> for WidgetConfig {
    type Error = String;

    fn try_from(raw: RawWidgetConfig) -> Result<Self, Self::Error> {
        if raw.id.trim().is_empty() {
            return Err("widget id must not be empty".to_string());
        }
        let kind = WidgetKind::from_props(raw.widget_type, raw.props)
            .map_err(|e| format!("invalid props for widget '{}': {}", raw.id, e))?;

        Ok(Self {
            id: raw.id,
            title: raw.title,
            description: raw.description,
            grid_column: raw.grid_column,
            grid_row: raw.grid_row,
            permissions: raw.permissions,
            kind,
            data_source: raw.data_source,
            chart_config: raw.chart_config,
        })
    }
}

impl From<WidgetConfig> for RawWidgetConfig {
    fn from(widget: WidgetConfig) -> Self {
        Self {
            widget_type: widget.kind.widget_type(),
            props: widget.kind.props_value(),
            id: widget.id,
            title: widget.title,
            description: widget.description,
            grid_column: widget.grid_column,
            grid_row: widget.grid_row,
            permissions: widget.permissions,
            data_source: widget.data_source,
            chart_config: widget.chart_config,
        }
    }
}

/// Partial update for a widget
///
/// `props` is merged key-by-key into the widget's current settings.
/// The widget's id and type cannot be changed through a patch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WidgetPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Raw size from the editing surface, clamped on apply
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "patch_size")]
    pub grid_column: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_row: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<WidgetPermissions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub props: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_source: Option<DataSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_config: Option<ChartConfig>,
}

/// An unreadable size in a patch leaves the widget's size untouched
fn patch_size<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    let size = coerce_grid_value(&value);
    if size.is_none() {
        tracing::warn!(value = %value, "Ignoring unreadable widget size in patch");
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_grid_span_mapping() {
        assert_eq!(grid_span(1), 3);
        assert_eq!(grid_span(2), 6);
        assert_eq!(grid_span(3), 9);
        assert_eq!(grid_span(4), 12);
        assert_eq!(grid_span(0), 1);
        assert_eq!(grid_span(9), 12);
        assert_eq!(GridSize::Half.span(), 6);
    }

    #[test]
    fn test_grid_size_clamps() {
        assert_eq!(GridSize::clamped(-3), GridSize::Quarter);
        assert_eq!(GridSize::clamped(1), GridSize::Quarter);
        assert_eq!(GridSize::clamped(2), GridSize::Half);
        assert_eq!(GridSize::clamped(3), GridSize::Full);
        assert_eq!(GridSize::clamped(40), GridSize::Full);
    }

    #[test]
    fn test_grid_size_coerces_strings_and_floats() {
        let size = |v: Value| serde_json::from_value::<GridSize>(v).unwrap();
        assert_eq!(size(json!("2")), GridSize::Half);
        assert_eq!(size(json!(" 4 ")), GridSize::Full);
        assert_eq!(size(json!(2.0)), GridSize::Half);
        assert_eq!(size(json!("1.0")), GridSize::Quarter);
        assert_eq!(size(json!(7.5)), GridSize::Full);
        assert_eq!(size(Value::Null), GridSize::Half);
        assert!(serde_json::from_value::<GridSize>(json!("wide")).is_err());
        assert!(serde_json::from_value::<GridSize>(json!([2])).is_err());

        let widget: WidgetConfig = serde_json::from_value(json!({
            "id": "w-str", "type": "table", "title": "Routes", "gridColumn": "4"
        }))
        .unwrap();
        assert_eq!(widget.grid_column, GridSize::Full);
    }

    #[test]
    fn test_patch_size_is_lenient() {
        let patch: WidgetPatch = serde_json::from_value(json!({"gridColumn": "1"})).unwrap();
        assert_eq!(patch.grid_column, Some(1));
        let patch: WidgetPatch = serde_json::from_value(json!({"gridColumn": 2.0, "title": "T"})).unwrap();
        assert_eq!(patch.grid_column, Some(2));
        let patch: WidgetPatch = serde_json::from_value(json!({"gridColumn": "huge", "title": "T"})).unwrap();
        assert_eq!(patch.grid_column, None);
        assert_eq!(patch.title.as_deref(), Some("T"));
    }

    #[test]
    fn test_widget_deserialize_typed_props() {
        let widget: WidgetConfig = serde_json::from_value(json!({
            "id": "w-collections",
            "type": "metric",
            "title": "Collections today",
            "gridColumn": 1,
            "props": {"format": "currency", "showTrend": true},
            "dataSource": {"endpoint": "/api/kpi/collections", "method": "GET"}
        }))
        .unwrap();

        assert_eq!(widget.grid_column, GridSize::Quarter);
        match &widget.kind {
            WidgetKind::Metric(props) => {
                assert_eq!(props.format, Some(MetricFormat::Currency));
                assert!(props.show_trend);
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_widget_defaults_and_clamp() {
        let widget: WidgetConfig = serde_json::from_value(json!({
            "id": "w1",
            "type": "approval-queue",
            "title": "Approvals",
            "gridColumn": 3
        }))
        .unwrap();
        assert_eq!(widget.grid_column, GridSize::Full);
        assert_eq!(
            widget.kind,
            WidgetKind::List(ListKind::ApprovalQueue, ListProps::default())
        );
    }

    #[test]
    fn test_widget_serialize_wire_form() {
        let widget = WidgetConfig::new("w2", "Pickups", WidgetKind::default_for(WidgetType::Chart))
            .with_view_permission("REPORT_VIEW")
            .with_action("export", "REPORT_EXPORT");
        let value = serde_json::to_value(&widget).unwrap();

        assert_eq!(value["type"], "chart");
        assert_eq!(value["gridColumn"], 2);
        assert_eq!(value["permissions"]["view"], "REPORT_VIEW");
        assert_eq!(value["permissions"]["actions"]["export"], "REPORT_EXPORT");
        assert!(value.get("props").is_none());
    }

    #[test]
    fn test_widget_rejects_bad_props_and_empty_id() {
        let bad_props = serde_json::from_value::<WidgetConfig>(json!({
            "id": "w3", "type": "table", "title": "t", "props": {"pageSize": "ten"}
        }));
        assert!(bad_props.is_err());

        let empty_id = serde_json::from_value::<WidgetConfig>(json!({
            "id": " ", "type": "table", "title": "t"
        }));
        assert!(empty_id.is_err());
    }

    #[test]
    fn test_unknown_metric_format_is_plain() {
        assert_eq!(MetricFormat::parse("kg"), MetricFormat::Plain);
        let props: MetricProps = serde_json::from_value(json!({"format": "tons"})).unwrap();
        assert_eq!(props.format, Some(MetricFormat::Plain));
    }

    #[test]
    fn test_custom_props_kept_verbatim() {
        let widget: WidgetConfig = serde_json::from_value(json!({
            "id": "w4", "type": "custom", "title": "Map", "props": {"zoom": 11, "layer": "bins"}
        }))
        .unwrap();
        let out = serde_json::to_value(&widget).unwrap();
        assert_eq!(out["props"], json!({"zoom": 11, "layer": "bins"}));
    }
}
