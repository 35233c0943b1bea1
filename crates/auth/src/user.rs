//! User account record and its lifecycle rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lostfound_core::{DomainError, DomainResult, UserId};

use crate::{Role, Subject};

/// Persistent user account.
///
/// # Invariants
/// - `email` is trimmed and lowercased.
/// - An account is enabled only while `active && !banned`.
/// - Nobody can change their own role, deactivate or ban themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub verified: bool,
    pub active: bool,
    pub banned: bool,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration input (password already hashed).
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

/// Minimum accepted password length at registration.
pub const MIN_PASSWORD_LEN: usize = 8;

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> DomainResult<()> {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return Err(DomainError::validation("invalid email format"));
    };
    if local.is_empty() || !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(DomainError::validation("invalid email format"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> DomainResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

impl UserAccount {
    /// Create a new student account.
    pub fn register(input: NewAccount, now: DateTime<Utc>) -> DomainResult<Self> {
        validate_email(&input.email)?;
        if input.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        Ok(Self {
            id: UserId::new(),
            email: normalize_email(&input.email),
            name: input.name.trim().to_string(),
            role: Role::Student,
            verified: false,
            active: true,
            banned: false,
            password_hash: input.password_hash,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.active && !self.banned
    }

    pub fn subject(&self) -> Subject {
        Subject::new(self.id, self.email.clone(), self.role)
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile::from(self)
    }

    pub fn change_role(&mut self, actor: UserId, role: Role, now: DateTime<Utc>) -> DomainResult<()> {
        if actor == self.id {
            return Err(DomainError::invariant("cannot change your own role"));
        }
        self.role = role;
        self.updated_at = now;
        Ok(())
    }

    pub fn set_banned(&mut self, actor: UserId, banned: bool, now: DateTime<Utc>) -> DomainResult<()> {
        if actor == self.id {
            return Err(DomainError::invariant("cannot ban or unban yourself"));
        }
        self.banned = banned;
        self.updated_at = now;
        Ok(())
    }

    pub fn set_active(&mut self, actor: UserId, active: bool, now: DateTime<Utc>) -> DomainResult<()> {
        if actor == self.id {
            return Err(DomainError::invariant("cannot change your own activation"));
        }
        self.active = active;
        self.updated_at = now;
        Ok(())
    }
}

/// Public view of an account (no credential material).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub verified: bool,
    pub is_active: bool,
    pub is_banned: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&UserAccount> for UserProfile {
    fn from(a: &UserAccount) -> Self {
        Self {
            id: a.id,
            email: a.email.clone(),
            name: a.name.clone(),
            role: a.role,
            verified: a.verified,
            is_active: a.active,
            is_banned: a.banned,
            created_at: a.created_at,
        }
    }
}
