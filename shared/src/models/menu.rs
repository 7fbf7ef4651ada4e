//! Menu Model

use serde::{Deserialize, Deserializer, Serialize};

/// Menu entry (菜单项)
///
/// Forms a tree; ids are unique across the whole tree.
///
/// `children` is the leaf/branch tag: `None` is a leaf, `Some(..)` is a
/// branch and always holds at least one child. An empty `children` array
/// in a stored document is read as a leaf, and filtering that empties a
/// branch turns it into a leaf, so the serialized form never carries `[]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub label: String,
    pub path: String,
    #[serde(default)]
    pub icon_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_children"
    )]
    pub children: Option<Vec<MenuItem>>,
}

fn default_visible() -> bool {
    true
}

fn deserialize_children<'de, D>(deserializer: D) -> Result<Option<Vec<MenuItem>>, D::Error>
where
    D: Deserializer<'de>,
{
    let children = Option::<Vec<MenuItem>>::deserialize(deserializer)?;
    Ok(children.filter(|c| !c.is_empty()))
}

impl MenuItem {
    /// Visible leaf without a permission gate
    pub fn leaf(id: impl Into<String>, label: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            path: path.into(),
            icon_key: String::new(),
            permission: None,
            visible: true,
            children: None,
        }
    }

    /// Gate this entry behind `code`
    pub fn with_permission(mut self, code: impl Into<String>) -> Self {
        self.permission = Some(code.into());
        self
    }

    pub fn with_icon(mut self, icon_key: impl Into<String>) -> Self {
        self.icon_key = icon_key.into();
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Attach children; an empty list keeps the entry a leaf
    pub fn with_children(mut self, children: Vec<MenuItem>) -> Self {
        self.children = if children.is_empty() {
            None
        } else {
            Some(children)
        };
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Children as a slice (empty for leaves)
    pub fn children(&self) -> &[MenuItem] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Depth-first lookup by id, including `self`
    pub fn find(&self, id: &str) -> Option<&MenuItem> {
        if self.id == id {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(id))
    }
}

/// Depth-first ids of a menu forest, in pre-order
pub fn menu_ids(items: &[MenuItem]) -> Vec<&str> {
    let mut ids = Vec::new();
    let mut stack: Vec<&MenuItem> = items.iter().rev().collect();
    while let Some(item) = stack.pop() {
        ids.push(item.id.as_str());
        stack.extend(item.children().iter().rev());
    }
    ids
}
