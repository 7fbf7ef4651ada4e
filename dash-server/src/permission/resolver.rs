//! Permission resolution
//!
//! ## 合并规则
//! - 以角色配置的权限表为基础（复制）
//! - 用户覆盖中的每个键直接覆盖（后写优先）
//! - 未被覆盖的键保持角色原值
//! - 菜单/组件可见性覆盖只作用于对应 id，未匹配的 id 静默忽略

use std::sync::Arc;

use shared::error::AppResult;
use shared::models::{
    ComputedPermissions, DashboardConfig, MenuItem, PermissionMap, Role, UserPermissionOverrides,
    WidgetConfig, menu_ids,
};
use shared::store::{ConfigStore, OverrideStore};

use super::menu_filter::filter_menu;
use super::widget_filter::filter_widgets;

/// Role permissions with the user's overrides written over them
///
/// `None` and overrides with an empty permission map give the same result.
pub fn merge_permissions(
    role_permissions: &PermissionMap,
    overrides: Option<&UserPermissionOverrides>,
) -> PermissionMap {
    let mut merged = role_permissions.clone();
    if let Some(overrides) = overrides {
        for (code, granted) in &overrides.permissions {
            merged.insert(code.clone(), *granted);
        }
    }
    merged
}

/// Prune the configuration's menu and widgets against `permissions`
/// and the user's visibility overrides
pub fn apply_visibility_overrides(
    config: &DashboardConfig,
    permissions: &PermissionMap,
    overrides: Option<&UserPermissionOverrides>,
) -> (Vec<MenuItem>, Vec<WidgetConfig>) {
    let menu_overrides = overrides.and_then(|o| o.menu_overrides.as_ref());
    let widget_overrides = overrides.and_then(|o| o.widget_overrides.as_ref());

    if let Some(menu_overrides) = menu_overrides {
        let known = menu_ids(&config.menu_items);
        for id in menu_overrides.keys() {
            if !known.contains(&id.as_str()) {
                tracing::debug!(role = %config.role, menu_id = %id, "Menu override matches no entry");
            }
        }
    }
    if let Some(widget_overrides) = widget_overrides {
        for id in widget_overrides.keys() {
            if !config.has_widget(id) {
                tracing::debug!(role = %config.role, widget_id = %id, "Widget override matches no widget");
            }
        }
    }

    let menu_items = filter_menu(&config.menu_items, permissions, menu_overrides);
    let widgets = filter_widgets(&config.widgets, permissions, widget_overrides);
    (menu_items, widgets)
}

/// Full resolution of an already-loaded configuration
pub fn compute(
    config: &DashboardConfig,
    overrides: Option<&UserPermissionOverrides>,
) -> ComputedPermissions {
    let permissions = merge_permissions(&config.permissions, overrides);
    let (menu_items, widgets) = apply_visibility_overrides(config, &permissions, overrides);
    ComputedPermissions {
        permissions,
        menu_items,
        widgets,
    }
}

/// Resolves `(role, user)` into [`ComputedPermissions`] using the stores
#[derive(Clone)]
pub struct PermissionResolver {
    configs: Arc<dyn ConfigStore>,
    overrides: Arc<dyn OverrideStore>,
}

impl PermissionResolver {
    pub fn new(configs: Arc<dyn ConfigStore>, overrides: Arc<dyn OverrideStore>) -> Self {
        Self { configs, overrides }
    }

    /// Load the stored configuration for `role`
    ///
    /// A role with nothing stored resolves to an empty configuration.
    pub async fn load_config(&self, role: &Role) -> AppResult<DashboardConfig> {
        match self.configs.get_config(role).await? {
            Some(doc) => DashboardConfig::from_stored(role, doc),
            None => {
                tracing::warn!(role = %role, "No dashboard configuration stored, using empty configuration");
                Ok(DashboardConfig::empty(role.clone()))
            }
        }
    }

    pub async fn resolve(&self, role: &Role, user_id: Option<&str>) -> AppResult<ComputedPermissions> {
        let config = self.load_config(role).await?;
        let overrides = match user_id {
            Some(user_id) => self.overrides.get_overrides(user_id).await?,
            None => None,
        };

        let computed = compute(&config, overrides.as_ref());
        tracing::debug!(
            role = %role,
            user_id = user_id.unwrap_or("-"),
            widgets = computed.widgets.len(),
            menu_items = computed.menu_items.len(),
            "Resolved dashboard permissions"
        );
        Ok(computed)
    }
}
