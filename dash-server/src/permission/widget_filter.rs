//! Widget visibility filter

use std::collections::BTreeMap;

use shared::models::{PermissionMap, WidgetConfig, action_allowed, is_granted};

/// Whether a single widget survives filtering
///
/// An override of `false` hides the widget outright. An override of
/// `true` does not bypass the widget's own `view` code: permission
/// denial is authoritative.
pub fn is_widget_visible(
    widget: &WidgetConfig,
    permissions: &PermissionMap,
    widget_overrides: Option<&BTreeMap<String, bool>>,
) -> bool {
    let overridden = widget_overrides.and_then(|overrides| overrides.get(&widget.id).copied());
    if overridden == Some(false) {
        return false;
    }
    match widget.view_permission() {
        Some(code) => is_granted(permissions, code),
        None => true,
    }
}

/// Stable, order-preserving filter over a widget list
///
/// Action codes are not evaluated here; see [`can_perform`].
pub fn filter_widgets(
    widgets: &[WidgetConfig],
    permissions: &PermissionMap,
    widget_overrides: Option<&BTreeMap<String, bool>>,
) -> Vec<WidgetConfig> {
    widgets
        .iter()
        .filter(|widget| is_widget_visible(widget, permissions, widget_overrides))
        .cloned()
        .collect()
}

/// Action-level check for a control inside a widget (approve, edit, ...)
pub fn can_perform(widget: &WidgetConfig, action: &str, permissions: &PermissionMap) -> bool {
    action_allowed(widget, action, permissions)
}
