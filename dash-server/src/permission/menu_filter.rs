//! Menu tree filter

use std::collections::BTreeMap;

use shared::models::{MenuItem, PermissionMap, is_granted};

/// Prune a menu forest against resolved permissions and visibility overrides
///
/// Order-preserving and depth-first. A node is dropped with its whole
/// subtree when its resolved visibility (override first, then `visible`)
/// is false, or when its permission code is not granted. A branch whose
/// children are all dropped comes back as a leaf.
pub fn filter_menu(
    items: &[MenuItem],
    permissions: &PermissionMap,
    menu_overrides: Option<&BTreeMap<String, bool>>,
) -> Vec<MenuItem> {
    items
        .iter()
        .filter_map(|item| filter_node(item, permissions, menu_overrides))
        .collect()
}

fn filter_node(
    item: &MenuItem,
    permissions: &PermissionMap,
    menu_overrides: Option<&BTreeMap<String, bool>>,
) -> Option<MenuItem> {
    let visible = menu_overrides
        .and_then(|overrides| overrides.get(&item.id).copied())
        .unwrap_or(item.visible);
    if !visible {
        return None;
    }

    if let Some(code) = item.permission.as_deref()
        && !is_granted(permissions, code)
    {
        return None;
    }

    let children = item
        .children
        .as_ref()
        .map(|children| filter_menu(children, permissions, menu_overrides))
        .filter(|children| !children.is_empty());

    // TODO: decide with the menu renderer whether emptied branches should be hidden instead
    if item.children.is_some() && children.is_none() {
        tracing::debug!(menu_id = %item.id, "All children filtered out, keeping entry as leaf");
    }

    Some(MenuItem {
        id: item.id.clone(),
        label: item.label.clone(),
        path: item.path.clone(),
        icon_key: item.icon_key.clone(),
        permission: item.permission.clone(),
        visible: true,
        children,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perms(entries: &[(&str, bool)]) -> PermissionMap {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn tree() -> Vec<MenuItem> {
        vec![
            MenuItem::leaf("dashboard", "Dashboard", "/"),
            MenuItem::leaf("masters", "Masters", "/masters").with_children(vec![
                MenuItem::leaf("routes", "Routes", "/masters/routes").with_permission("ROUTE_VIEW"),
                MenuItem::leaf("contracts", "Contracts", "/masters/contracts")
                    .with_permission("CONTRACT_VIEW"),
                MenuItem::leaf("frequencies", "Frequencies", "/masters/frequencies"),
            ]),
            MenuItem::leaf("reports", "Reports", "/reports")
                .with_permission("REPORT_VIEW")
                .with_children(vec![MenuItem::leaf("daily", "Daily", "/reports/daily")]),
            MenuItem::leaf("barcodes", "Barcodes", "/barcodes").with_visible(false),
        ]
    }

    fn ids(items: &[MenuItem]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_parent_without_surviving_children_becomes_leaf() {
        let tree = vec![MenuItem::leaf("a", "A", "/a").with_children(vec![
            MenuItem::leaf("b", "B", "/a/b").with_permission("X"),
        ])];
        let out = filter_menu(&tree, &perms(&[("X", false)]), None);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "a");
        assert!(out[0].children.is_none());
        let json = serde_json::to_value(&out[0]).unwrap();
        assert!(json.get("children").is_none());
    }

    #[test]
    fn test_order_preserved_and_denied_subtrees_dropped() {
        let out = filter_menu(&tree(), &perms(&[("ROUTE_VIEW", true)]), None);

        assert_eq!(ids(&out), vec!["dashboard", "masters"]);
        assert_eq!(ids(out[1].children()), vec!["routes", "frequencies"]);
    }

    #[test]
    fn test_menu_override_wins_over_visible_flag() {
        let mut overrides = BTreeMap::new();
        overrides.insert("barcodes".to_string(), true);
        overrides.insert("dashboard".to_string(), false);

        let out = filter_menu(&tree(), &perms(&[]), Some(&overrides));
        assert_eq!(ids(&out), vec!["masters", "barcodes"]);
        assert!(out[1].visible);
    }

    #[test]
    fn test_override_cannot_bypass_permission() {
        let mut overrides = BTreeMap::new();
        overrides.insert("reports".to_string(), true);

        let out = filter_menu(&tree(), &perms(&[("REPORT_VIEW", false)]), Some(&overrides));
        assert!(!ids(&out).contains(&"reports"));
    }

    #[test]
    fn test_wildcard_grants_all_entries() {
        let out = filter_menu(&tree(), &perms(&[("all", true)]), None);
        assert_eq!(ids(&out), vec!["dashboard", "masters", "reports"]);
        assert_eq!(out[1].children().len(), 3);
    }

    #[test]
    fn test_idempotent() {
        let permissions = perms(&[("CONTRACT_VIEW", true), ("REPORT_VIEW", true)]);
        let mut overrides = BTreeMap::new();
        overrides.insert("frequencies".to_string(), false);

        let once = filter_menu(&tree(), &permissions, Some(&overrides));
        let twice = filter_menu(&once, &permissions, Some(&overrides));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_input_not_mutated() {
        let input = tree();
        let snapshot = input.clone();
        let _ = filter_menu(&input, &perms(&[]), None);
        assert_eq!(input, snapshot);
    }
}
