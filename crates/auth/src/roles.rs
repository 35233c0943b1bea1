use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Account role used for RBAC.
///
/// Closed set: a token or database row carrying anything else is rejected at
/// deserialization time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Student,
    Admin,
    Moderator,
    SupportStaff,
}

impl Role {
    /// Roles allowed into the admin dashboard context.
    pub const ADMIN_CONTEXT: &'static [Role] = &[Role::Admin, Role::Moderator, Role::SupportStaff];

    /// Roles allowed to moderate users and content.
    pub const MODERATION: &'static [Role] = &[Role::Admin, Role::Moderator];

    /// Roles allowed to manage accounts (role changes, deactivation).
    pub const USER_MANAGEMENT: &'static [Role] = &[Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Admin => "admin",
            Role::Moderator => "moderator",
            Role::SupportStaff => "support_staff",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "admin" => Ok(Role::Admin),
            "moderator" => Ok(Role::Moderator),
            "support_staff" => Ok(Role::SupportStaff),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_names_match_as_str() {
        for role in [Role::Student, Role::Admin, Role::Moderator, Role::SupportStaff] {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!("superuser".parse::<Role>().is_err());
        assert!(serde_json::from_str::<Role>("\"superuser\"").is_err());
    }
}
