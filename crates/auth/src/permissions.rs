use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Role;

/// Permission identifier.
///
/// Permissions are opaque strings (e.g. "users.ban"). The wildcard `"*"`
/// grants everything and is reserved for the admin role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

pub const ALL: Permission = Permission::from_static("*");
pub const USERS_READ: Permission = Permission::from_static("users.read");
pub const USERS_BAN: Permission = Permission::from_static("users.ban");
pub const ITEMS_MODERATE: Permission = Permission::from_static("items.moderate");
pub const CLAIMS_MODERATE: Permission = Permission::from_static("claims.moderate");
pub const REPORTS_READ: Permission = Permission::from_static("reports.read");

/// Static role → permission mapping.
pub fn permissions_for_role(role: Role) -> Vec<Permission> {
    match role {
        Role::Admin => vec![ALL],
        Role::Moderator => vec![
            USERS_READ,
            USERS_BAN,
            ITEMS_MODERATE,
            CLAIMS_MODERATE,
            REPORTS_READ,
        ],
        Role::SupportStaff => vec![USERS_READ, REPORTS_READ],
        Role::Student => Vec::new(),
    }
}

/// Whether `role` grants `required` (directly or via the wildcard).
pub fn role_grants(role: Role, required: &Permission) -> bool {
    permissions_for_role(role)
        .iter()
        .any(|p| p.is_wildcard() || p == required)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_holds_wildcard() {
        assert!(role_grants(Role::Admin, &USERS_BAN));
        assert!(role_grants(Role::Admin, &Permission::new("anything.at.all")));
    }

    #[test]
    fn support_staff_cannot_ban() {
        assert!(role_grants(Role::SupportStaff, &REPORTS_READ));
        assert!(!role_grants(Role::SupportStaff, &USERS_BAN));
    }

    #[test]
    fn students_have_no_admin_permissions() {
        assert!(permissions_for_role(Role::Student).is_empty());
    }
}
