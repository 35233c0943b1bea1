use lostfound_auth::{Role, Subject, UserAccount};
use lostfound_core::UserId;

/// Identity proven by the bearer token.
///
/// Email and role are as of token issuance and may be stale; anything
/// security-relevant must consult [`AccountContext`] or a fresh lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectContext {
    subject: Subject,
}

impl SubjectContext {
    pub fn new(subject: Subject) -> Self {
        Self { subject }
    }

    pub fn user_id(&self) -> UserId {
        self.subject.id
    }

    pub fn email(&self) -> &str {
        &self.subject.email
    }

    pub fn token_role(&self) -> Role {
        self.subject.role
    }
}

/// Freshly loaded, enabled account of the caller (set by the account and role gates).
#[derive(Debug, Clone)]
pub struct AccountContext {
    account: UserAccount,
}

impl AccountContext {
    pub fn new(account: UserAccount) -> Self {
        Self { account }
    }

    pub fn account(&self) -> &UserAccount {
        &self.account
    }

    pub fn user_id(&self) -> UserId {
        self.account.id
    }
}
