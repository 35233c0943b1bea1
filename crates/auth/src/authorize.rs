use thiserror::Error;

use crate::permissions::role_grants;
use crate::{Permission, Role, UserAccount};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("account is deactivated or banned")]
    AccountDisabled,

    #[error("role '{0}' is not allowed here")]
    RoleNotAllowed(Role),

    #[error("forbidden: missing permission '{0}'")]
    MissingPermission(String),
}

/// Role gate over a freshly loaded account.
///
/// The account must come from storage, not from token claims: role and
/// activation can change after a token is issued.
///
/// - No IO
/// - No panics
pub fn require_role(account: &UserAccount, allowed: &[Role]) -> Result<(), AuthzError> {
    if !account.is_enabled() {
        return Err(AuthzError::AccountDisabled);
    }
    if !allowed.contains(&account.role) {
        return Err(AuthzError::RoleNotAllowed(account.role));
    }
    Ok(())
}

/// Permission check over a freshly loaded account.
pub fn require_permission(account: &UserAccount, required: &Permission) -> Result<(), AuthzError> {
    if !account.is_enabled() {
        return Err(AuthzError::AccountDisabled);
    }
    if role_grants(account.role, required) {
        Ok(())
    } else {
        Err(AuthzError::MissingPermission(required.as_str().to_string()))
    }
}
