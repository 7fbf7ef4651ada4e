//! 配置编辑器
//!
//! Pure operations over a [`DashboardConfig`]. Every operation takes the
//! current document by reference and returns a new one; nothing here
//! persists, and lookup misses are silent no-ops so an editing surface
//! racing a concurrent removal never fails.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use shared::error::{AppError, AppResult};
use shared::models::{
    CatalogItem, ChartConfig, DashboardConfig, DataSource, GridSize, MetricFormat, Role,
    WidgetConfig, WidgetKind, WidgetPatch, WidgetType,
};

/// Hex characters of a v4 uuid kept in generated widget ids
const WIDGET_ID_HEX_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

/// Instantiate a catalog item as a new half-width widget at the end of the list
pub fn add_widget_from_catalog(
    config: &DashboardConfig,
    item: &CatalogItem,
    widget_type: WidgetType,
) -> DashboardConfig {
    let mut kind = WidgetKind::default_for(widget_type);
    if let (WidgetKind::Metric(props), Some(format)) = (&mut kind, item.format.as_deref()) {
        props.format = Some(MetricFormat::parse(format));
    }

    let chart_config = match widget_type {
        WidgetType::Chart => item.default_chart_type().map(ChartConfig::of_type),
        _ => None,
    };

    let mut widget = WidgetConfig::new(new_widget_id(config), item.title.clone(), kind)
        .with_data_source(DataSource::get(item.api.clone()));
    widget.description = item.description.clone();
    widget.grid_column = GridSize::Half;
    widget.chart_config = chart_config;

    tracing::debug!(
        role = %config.role,
        widget_id = %widget.id,
        catalog_code = %item.code,
        widget_type = widget_type.as_str(),
        "Widget added from catalog"
    );

    let mut next = config.clone();
    next.widgets.push(widget);
    next
}

/// Merge `patch` into widget `id`; a missing id returns the document unchanged
pub fn update_widget(config: &DashboardConfig, id: &str, patch: &WidgetPatch) -> DashboardConfig {
    let mut next = config.clone();
    let Some(widget) = next.widgets.iter_mut().find(|w| w.id == id) else {
        tracing::debug!(role = %config.role, widget_id = %id, "Update for unknown widget ignored");
        return next;
    };

    if let Some(title) = &patch.title {
        widget.title = title.clone();
    }
    if let Some(description) = &patch.description {
        widget.description = Some(description.clone());
    }
    if let Some(raw) = patch.grid_column {
        widget.grid_column = GridSize::from(raw);
    }
    if let Some(row) = patch.grid_row {
        widget.grid_row = Some(row);
    }
    if let Some(permissions) = &patch.permissions {
        widget.permissions = Some(permissions.clone());
    }
    if let Some(source) = &patch.data_source {
        widget.data_source = Some(source.clone());
    }
    if let Some(chart) = &patch.chart_config {
        widget.chart_config = Some(chart.clone());
    }
    if let Some(props) = &patch.props {
        match merge_props(&widget.kind, props) {
            Ok(kind) => widget.kind = kind,
            Err(e) => {
                tracing::warn!(widget_id = %id, error = %e, "Invalid props in widget update, keeping previous settings");
            }
        }
    }

    next
}

/// Drop widget `id`; a missing id returns the document unchanged
pub fn remove_widget(config: &DashboardConfig, id: &str) -> DashboardConfig {
    let mut next = config.clone();
    next.widgets.retain(|w| w.id != id);
    next
}

/// Swap widget `id` with its neighbour; no-op at either end
pub fn reorder_widget(config: &DashboardConfig, id: &str, direction: MoveDirection) -> DashboardConfig {
    let mut next = config.clone();
    let Some(index) = next.widget_position(id) else {
        return next;
    };
    let target = match direction {
        MoveDirection::Up => index.checked_sub(1),
        MoveDirection::Down => Some(index + 1).filter(|t| *t < next.widgets.len()),
    };
    if let Some(target) = target {
        next.widgets.swap(index, target);
    }
    next
}

/// Read a document posted to the editor
///
/// Same leniency as [`prepare_for_save`]: malformed widgets and menu
/// entries are dropped, only a non-object or role-less document is
/// rejected.
pub fn open_document(doc: Value) -> AppResult<DashboardConfig> {
    let role = match doc.get("role") {
        Some(Value::String(role)) if !role.trim().is_empty() => Role::from(role.as_str()),
        _ if !doc.is_object() => {
            return Err(AppError::validation("Dashboard configuration must be a JSON object"));
        }
        _ => return Err(AppError::validation("Dashboard configuration has no role")),
    };
    DashboardConfig::from_stored(&role, doc)
}

/// Reduce a posted document to its well-formed parts before it is stored
///
/// The document is always stored under `role`, whatever its own `role`
/// field says.
pub fn prepare_for_save(role: &Role, doc: Value) -> AppResult<DashboardConfig> {
    if !doc.is_object() {
        return Err(AppError::validation("Dashboard configuration must be a JSON object"));
    }
    let mut config = DashboardConfig::from_stored(role, doc)?;
    if config.role != *role {
        tracing::warn!(role = %role, document_role = %config.role, "Document role differs from target, overriding");
        config.role = role.clone();
    }
    Ok(config)
}

fn new_widget_id(config: &DashboardConfig) -> String {
    loop {
        let hex = Uuid::new_v4().simple().to_string();
        let id = format!("w-{}", &hex[..WIDGET_ID_HEX_LEN]);
        if !config.has_widget(&id) {
            return id;
        }
    }
}

/// Key-by-key merge of `patch` over the kind's current settings
///
/// A `null` value resets that setting.
fn merge_props(kind: &WidgetKind, patch: &Map<String, Value>) -> serde_json::Result<WidgetKind> {
    let mut merged = match kind.props_value() {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    for (key, value) in patch {
        if value.is_null() {
            merged.remove(key);
        } else {
            merged.insert(key.clone(), value.clone());
        }
    }
    WidgetKind::from_props(kind.widget_type(), Some(Value::Object(merged)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared::models::{MetricProps, TableProps};
    use std::collections::HashSet;

    fn catalog_item() -> CatalogItem {
        serde_json::from_value(json!({
            "code": "chart-pickups",
            "title": "Pickups per route",
            "api": "/api/charts/pickups",
            "chartTypes": ["bar", "line"],
            "roles": ["operations"]
        }))
        .unwrap()
    }

    fn kpi_item() -> CatalogItem {
        serde_json::from_value(json!({
            "code": "kpi-revenue",
            "title": "Revenue",
            "api": "/api/kpi/revenue",
            "format": "currency",
            "description": "Month to date"
        }))
        .unwrap()
    }

    fn config_with(ids: &[&str]) -> DashboardConfig {
        let mut config = DashboardConfig::empty(Role::from("operations"));
        for id in ids {
            config.widgets.push(WidgetConfig::new(
                *id,
                *id,
                WidgetKind::default_for(WidgetType::Metric),
            ));
        }
        config
    }

    fn ids(config: &DashboardConfig) -> Vec<&str> {
        config.widgets.iter().map(|w| w.id.as_str()).collect()
    }

    #[test]
    fn test_add_chart_from_catalog() {
        let config = config_with(&["a"]);
        let next = add_widget_from_catalog(&config, &catalog_item(), WidgetType::Chart);

        assert_eq!(config.widgets.len(), 1);
        assert_eq!(next.widgets.len(), 2);
        let added = &next.widgets[1];
        assert!(added.id.starts_with("w-"));
        assert_eq!(added.grid_column, GridSize::Half);
        assert_eq!(added.data_source.as_ref().unwrap().endpoint, "/api/charts/pickups");
        assert_eq!(added.chart_config.as_ref().unwrap().chart_type, "bar");
    }

    #[test]
    fn test_add_non_chart_has_no_chart_config() {
        let next = add_widget_from_catalog(&config_with(&[]), &catalog_item(), WidgetType::Table);
        assert!(next.widgets[0].chart_config.is_none());

        let next = add_widget_from_catalog(&config_with(&[]), &kpi_item(), WidgetType::Chart);
        assert!(next.widgets[0].chart_config.is_none());
    }

    #[test]
    fn test_add_metric_carries_format() {
        let next = add_widget_from_catalog(&config_with(&[]), &kpi_item(), WidgetType::Metric);
        let widget = &next.widgets[0];
        assert_eq!(widget.description.as_deref(), Some("Month to date"));
        match &widget.kind {
            WidgetKind::Metric(props) => assert_eq!(props.format, Some(MetricFormat::Currency)),
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_thousand_adds_unique_ids() {
        let item = kpi_item();
        let mut config = config_with(&[]);
        for _ in 0..1000 {
            config = add_widget_from_catalog(&config, &item, WidgetType::Metric);
        }
        let unique: HashSet<_> = config.widgets.iter().map(|w| w.id.clone()).collect();
        assert_eq!(unique.len(), 1000);
    }

    #[test]
    fn test_remove_then_add_does_not_reuse_id() {
        let item = kpi_item();
        let config = add_widget_from_catalog(&config_with(&[]), &item, WidgetType::Metric);
        let removed_id = config.widgets[0].id.clone();

        let config = remove_widget(&config, &removed_id);
        assert!(config.widgets.is_empty());
        let config = add_widget_from_catalog(&config, &item, WidgetType::Metric);
        assert_ne!(config.widgets[0].id, removed_id);
    }

    #[test]
    fn test_update_missing_id_is_noop() {
        let config = config_with(&["a", "b"]);
        let patch = WidgetPatch {
            title: Some("New".into()),
            ..Default::default()
        };
        assert_eq!(update_widget(&config, "zzz", &patch), config);
    }

    #[test]
    fn test_update_clamps_size_and_merges_props() {
        let mut config = config_with(&["a"]);
        config.widgets[0].kind = WidgetKind::Metric(MetricProps {
            format: Some(MetricFormat::Currency),
            ..Default::default()
        });

        let patch: WidgetPatch = serde_json::from_value(json!({
            "title": "Revenue",
            "gridColumn": 7,
            "props": {"showTrend": true}
        }))
        .unwrap();
        let next = update_widget(&config, "a", &patch);
        let widget = &next.widgets[0];

        assert_eq!(widget.title, "Revenue");
        assert_eq!(widget.grid_column, GridSize::Full);
        match &widget.kind {
            WidgetKind::Metric(props) => {
                assert_eq!(props.format, Some(MetricFormat::Currency));
                assert!(props.show_trend);
            }
            other => panic!("unexpected kind: {:?}", other),
        }

        let shrink = WidgetPatch {
            grid_column: Some(0),
            ..Default::default()
        };
        assert_eq!(update_widget(&next, "a", &shrink).widgets[0].grid_column, GridSize::Quarter);
    }

    #[test]
    fn test_update_bad_props_keeps_previous() {
        let mut config = config_with(&[]);
        config.widgets.push(WidgetConfig::new(
            "t",
            "Table",
            WidgetKind::Table(TableProps {
                page_size: Some(20),
                columns: None,
            }),
        ));
        let patch: WidgetPatch =
            serde_json::from_value(json!({"title": "Routes", "props": {"pageSize": "lots"}})).unwrap();

        let next = update_widget(&config, "t", &patch);
        assert_eq!(next.widgets[0].title, "Routes");
        assert_eq!(next.widgets[0].kind, config.widgets[0].kind);
    }

    #[test]
    fn test_reorder_boundaries_are_noops() {
        let config = config_with(&["a", "b", "c"]);
        assert_eq!(reorder_widget(&config, "a", MoveDirection::Up), config);
        assert_eq!(reorder_widget(&config, "c", MoveDirection::Down), config);
        assert_eq!(reorder_widget(&config, "zzz", MoveDirection::Down), config);

        assert_eq!(ids(&reorder_widget(&config, "b", MoveDirection::Up)), vec!["b", "a", "c"]);
        assert_eq!(ids(&reorder_widget(&config, "b", MoveDirection::Down)), vec!["a", "c", "b"]);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let config = config_with(&["a"]);
        assert_eq!(remove_widget(&config, "b"), config);
    }

    #[test]
    fn test_prepare_for_save_filters_and_forces_role() {
        let doc = json!({
            "role": "finance",
            "widgets": [
                {"id": "a", "type": "metric", "title": "A"},
                {"id": "b", "type": "mystery"},
                {"id": "a", "type": "table", "title": "dup"}
            ]
        });
        let config = prepare_for_save(&Role::from("operations"), doc).unwrap();
        assert_eq!(config.role, Role::from("operations"));
        assert_eq!(ids(&config), vec!["a"]);

        let err = prepare_for_save(&Role::from("operations"), json!([])).unwrap_err();
        assert_eq!(err.code, shared::error::ErrorCode::ValidationFailed);
    }

    #[test]
    fn test_open_document_keeps_good_widgets() {
        let doc = json!({
            "role": "operations",
            "widgets": [
                {"id": "a", "type": "metric", "title": "A", "gridColumn": "4"},
                {"id": "bad", "type": "no-such-type"},
                "junk"
            ],
            "menuItems": {"not": "a list"}
        });
        let config = open_document(doc).unwrap();
        assert_eq!(config.role, Role::from("operations"));
        assert_eq!(ids(&config), vec!["a"]);
        assert_eq!(config.widgets[0].grid_column, GridSize::Full);
        assert!(config.menu_items.is_empty());

        let err = open_document(json!({"widgets": []})).unwrap_err();
        assert_eq!(err.code, shared::error::ErrorCode::ValidationFailed);
        let err = open_document(json!("operations")).unwrap_err();
        assert_eq!(err.code, shared::error::ErrorCode::ValidationFailed);
    }

    #[test]
    fn test_move_direction_serde() {
        let up: MoveDirection = serde_json::from_value(json!("up")).unwrap();
        assert_eq!(up, MoveDirection::Up);
        assert_eq!(serde_json::to_value(MoveDirection::Down).unwrap(), json!("down"));
    }
}
