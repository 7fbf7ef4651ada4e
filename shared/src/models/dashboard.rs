//! Dashboard Configuration Model

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use super::menu::MenuItem;
use super::permission::PermissionMap;
use super::role::Role;
use super::widget::WidgetConfig;
use crate::error::{AppError, AppResult};

/// Dashboard configuration for one role/department key (角色仪表盘配置)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardConfig {
    pub role: Role,
    #[serde(default)]
    pub widgets: Vec<WidgetConfig>,
    #[serde(default)]
    pub menu_items: Vec<MenuItem>,
    #[serde(default)]
    pub permissions: PermissionMap,
}

impl DashboardConfig {
    /// Configuration with no widgets, no menu and no grants
    pub fn empty(role: Role) -> Self {
        Self {
            role,
            widgets: Vec::new(),
            menu_items: Vec::new(),
            permissions: PermissionMap::new(),
        }
    }

    pub fn widget(&self, id: &str) -> Option<&WidgetConfig> {
        self.widgets.iter().find(|w| w.id == id)
    }

    pub fn widget_position(&self, id: &str) -> Option<usize> {
        self.widgets.iter().position(|w| w.id == id)
    }

    pub fn has_widget(&self, id: &str) -> bool {
        self.widget_position(id).is_some()
    }

    /// Read a stored document leniently
    ///
    /// Well-formed widgets and menu entries are kept; malformed ones are
    /// dropped with a warning instead of failing the whole document. A
    /// `widgets`/`menuItems` field that is not a list reads as empty, and
    /// a missing `role` falls back to the key the document was stored under.
    /// Only a document that is not a JSON object is rejected.
    pub fn from_stored(key: &Role, value: Value) -> AppResult<Self> {
        let Value::Object(mut doc) = value else {
            return Err(AppError::config_malformed(format!(
                "Configuration for role '{}' is not an object",
                key
            )));
        };

        let role = match doc.remove("role") {
            Some(Value::String(role)) if !role.is_empty() => Role::from(role),
            _ => key.clone(),
        };

        let widgets = parse_list::<WidgetConfig>(&role, "widgets", doc.remove("widgets"));
        let menu_items = parse_list::<MenuItem>(&role, "menuItems", doc.remove("menuItems"));

        let mut permissions = PermissionMap::new();
        match doc.remove("permissions") {
            Some(Value::Object(map)) => {
                for (code, granted) in map {
                    match granted {
                        Value::Bool(granted) => {
                            permissions.insert(code, granted);
                        }
                        other => {
                            tracing::warn!(role = %role, code = %code, value = %other, "Dropping non-boolean permission");
                        }
                    }
                }
            }
            None | Some(Value::Null) => {}
            Some(other) => {
                tracing::warn!(role = %role, value = %other, "Permissions field is not an object, ignoring");
            }
        }

        Ok(Self {
            role,
            widgets,
            menu_items,
            permissions,
        }
        .normalized())
    }

    /// Drop later widgets that repeat an earlier id
    pub fn normalized(mut self) -> Self {
        let mut seen = HashSet::new();
        let role = self.role.clone();
        self.widgets.retain(|w| {
            let first = seen.insert(w.id.clone());
            if !first {
                tracing::warn!(role = %role, widget_id = %w.id, "Dropping duplicate widget id");
            }
            first
        });
        self
    }
}

fn parse_list<T: serde::de::DeserializeOwned>(role: &Role, field: &str, value: Option<Value>) -> Vec<T> {
    match value {
        Some(Value::Array(entries)) => entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value::<T>(entry) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    tracing::warn!(role = %role, field, index, error = %e, "Dropping malformed entry");
                    None
                }
            })
            .collect(),
        None | Some(Value::Null) => Vec::new(),
        Some(other) => {
            tracing::warn!(role = %role, field, value = %other, "Field is not a list, treating as empty");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_stored_keeps_valid_widgets() {
        let doc = json!({
            "role": "operations",
            "widgets": [
                {"id": "a", "type": "metric", "title": "A"},
                {"id": "b", "type": "no-such-type", "title": "B"},
                "garbage",
                {"id": "c", "type": "table", "title": "C"},
                {"id": "a", "type": "chart", "title": "A again"}
            ],
            "menuItems": [{"id": "home", "label": "Home", "path": "/"}],
            "permissions": {"ROUTE_VIEW": true, "ROUTE_EDIT": "yes"}
        });

        let config = DashboardConfig::from_stored(&Role::from("operations"), doc).unwrap();
        let ids: Vec<_> = config.widgets.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(config.menu_items.len(), 1);
        assert_eq!(config.permissions.len(), 1);
        assert_eq!(config.permissions.get("ROUTE_VIEW"), Some(&true));
    }

    #[test]
    fn test_from_stored_non_list_widgets() {
        let doc = json!({"widgets": {"id": "a"}, "menuItems": "nope"});
        let config = DashboardConfig::from_stored(&Role::from("finance"), doc).unwrap();
        assert_eq!(config.role, Role::from("finance"));
        assert!(config.widgets.is_empty());
        assert!(config.menu_items.is_empty());
    }

    #[test]
    fn test_from_stored_rejects_non_object() {
        let err = DashboardConfig::from_stored(&Role::from("finance"), json!([1, 2])).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ConfigMalformed);
    }

    #[test]
    fn test_serialize_camel_case() {
        let config = DashboardConfig::empty(Role::from("admin"));
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["role"], "admin");
        assert!(value["menuItems"].as_array().unwrap().is_empty());
    }
}
