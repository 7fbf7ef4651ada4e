//! Per-user overrides and the computed result of a resolution

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::menu::MenuItem;
use super::permission::{PermissionMap, is_granted};
use super::widget::WidgetConfig;

/// Per-user exceptions layered on top of a role's configuration (用户权限覆盖)
///
/// Produced by an external admin workflow; read-only here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPermissionOverrides {
    pub user_id: String,
    #[serde(default)]
    pub permissions: PermissionMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu_overrides: Option<BTreeMap<String, bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget_overrides: Option<BTreeMap<String, bool>>,
}

impl UserPermissionOverrides {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    pub fn with_permission(mut self, code: impl Into<String>, granted: bool) -> Self {
        self.permissions.insert(code.into(), granted);
        self
    }

    pub fn with_menu_override(mut self, menu_id: impl Into<String>, visible: bool) -> Self {
        self.menu_overrides
            .get_or_insert_with(BTreeMap::new)
            .insert(menu_id.into(), visible);
        self
    }

    pub fn with_widget_override(mut self, widget_id: impl Into<String>, visible: bool) -> Self {
        self.widget_overrides
            .get_or_insert_with(BTreeMap::new)
            .insert(widget_id.into(), visible);
        self
    }
}

/// Result of merging a role configuration with a user's overrides
///
/// Ephemeral: recomputed whenever the active role or user changes and
/// never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedPermissions {
    pub permissions: PermissionMap,
    pub menu_items: Vec<MenuItem>,
    pub widgets: Vec<WidgetConfig>,
}

impl ComputedPermissions {
    pub fn has_permission(&self, code: &str) -> bool {
        is_granted(&self.permissions, code)
    }

    pub fn widget(&self, id: &str) -> Option<&WidgetConfig> {
        self.widgets.iter().find(|w| w.id == id)
    }

    /// Whether `action` may be performed on visible widget `widget_id`
    ///
    /// Actions without a mapped code are allowed; unknown or hidden
    /// widgets allow nothing.
    pub fn can_perform(&self, widget_id: &str, action: &str) -> bool {
        self.widget(widget_id)
            .is_some_and(|w| action_allowed(w, action, &self.permissions))
    }

    /// Permitted actions of a visible widget, sorted by name
    pub fn widget_actions(&self, widget_id: &str) -> Vec<String> {
        let Some(widget) = self.widget(widget_id) else {
            return Vec::new();
        };
        let Some(perms) = widget.permissions.as_ref() else {
            return Vec::new();
        };
        perms
            .actions
            .iter()
            .filter(|(_, code)| is_granted(&self.permissions, code))
            .map(|(action, _)| action.clone())
            .collect()
    }
}

/// Action-level check for a single widget control
pub fn action_allowed(widget: &WidgetConfig, action: &str, permissions: &PermissionMap) -> bool {
    match widget.action_permission(action) {
        Some(code) => is_granted(permissions, code),
        None => true,
    }
}
