//! Widget Catalog Model
//!
//! The catalog is supplied by the backend and lists the widget templates
//! an operator may instantiate, grouped into five families.

use serde::{Deserialize, Serialize};

use super::permission::ALL_PERMISSION;
use super::role::Role;
use super::widget::WidgetType;

/// Catalog entry (组件模板)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub code: String,
    pub title: String,
    /// Endpoint the instantiated widget loads from
    pub api: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_types: Option<Vec<String>>,
    /// Roles allowed to add this item; empty means everyone
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CatalogItem {
    pub fn available_to(&self, role: &Role) -> bool {
        self.roles.is_empty()
            || self
                .roles
                .iter()
                .any(|r| r == role.as_str() || r == ALL_PERMISSION)
    }

    /// First advertised chart variant
    pub fn default_chart_type(&self) -> Option<&str> {
        self.chart_types.as_ref()?.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogFamily {
    Kpis,
    Charts,
    Tables,
    Tasks,
    Alerts,
}

impl CatalogFamily {
    pub const ALL: [CatalogFamily; 5] = [
        Self::Kpis,
        Self::Charts,
        Self::Tables,
        Self::Tasks,
        Self::Alerts,
    ];

    /// Widget type used when the operator does not pick one
    pub const fn default_widget_type(&self) -> WidgetType {
        match self {
            Self::Kpis => WidgetType::Metric,
            Self::Charts => WidgetType::Chart,
            Self::Tables => WidgetType::Table,
            Self::Tasks => WidgetType::TaskList,
            Self::Alerts => WidgetType::Alert,
        }
    }
}

/// Full catalog as returned by `getCatalog`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub kpis: Vec<CatalogItem>,
    pub charts: Vec<CatalogItem>,
    pub tables: Vec<CatalogItem>,
    pub tasks: Vec<CatalogItem>,
    pub alerts: Vec<CatalogItem>,
}

impl Catalog {
    pub fn family(&self, family: CatalogFamily) -> &[CatalogItem] {
        match family {
            CatalogFamily::Kpis => &self.kpis,
            CatalogFamily::Charts => &self.charts,
            CatalogFamily::Tables => &self.tables,
            CatalogFamily::Tasks => &self.tasks,
            CatalogFamily::Alerts => &self.alerts,
        }
    }

    fn family_mut(&mut self, family: CatalogFamily) -> &mut Vec<CatalogItem> {
        match family {
            CatalogFamily::Kpis => &mut self.kpis,
            CatalogFamily::Charts => &mut self.charts,
            CatalogFamily::Tables => &mut self.tables,
            CatalogFamily::Tasks => &mut self.tasks,
            CatalogFamily::Alerts => &mut self.alerts,
        }
    }

    /// All items with their family, in family order
    pub fn iter(&self) -> impl Iterator<Item = (CatalogFamily, &CatalogItem)> {
        CatalogFamily::ALL
            .into_iter()
            .flat_map(move |family| self.family(family).iter().map(move |item| (family, item)))
    }

    pub fn find(&self, code: &str) -> Option<(CatalogFamily, &CatalogItem)> {
        self.iter().find(|(_, item)| item.code == code)
    }

    /// Catalog restricted to items `role` may instantiate
    pub fn for_role(&self, role: &Role) -> Catalog {
        let mut filtered = Catalog::default();
        for (family, item) in self.iter() {
            if item.available_to(role) {
                filtered.family_mut(family).push(item.clone());
            }
        }
        filtered
    }

    pub fn len(&self) -> usize {
        CatalogFamily::ALL
            .iter()
            .map(|family| self.family(*family).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
