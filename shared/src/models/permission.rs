//! Permission codes and the single grant check every filter goes through

use std::collections::BTreeMap;

/// Map from permission code to granted flag
pub type PermissionMap = BTreeMap<String, bool>;

/// 超级权限: grants every code when present and `true`
pub const ALL_PERMISSION: &str = "all";

/// Check whether `code` is granted in `permissions`
///
/// The wildcard short-circuits: an explicit `false` on `code` does not
/// matter while `all` is `true`. Absent codes are denied.
pub fn is_granted(permissions: &PermissionMap, code: &str) -> bool {
    if permissions.get(ALL_PERMISSION).copied().unwrap_or(false) {
        return true;
    }
    permissions.get(code).copied().unwrap_or(false)
}
