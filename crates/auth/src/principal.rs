use serde::{Deserialize, Serialize};

use lostfound_core::UserId;

use crate::Role;

/// Identity of an authenticated caller, as carried by a verified token.
///
/// Email and role reflect the account at issuance time and may be stale;
/// anything security-relevant beyond "who is calling" must re-read the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: UserId,
    pub email: String,
    pub role: Role,
}

impl Subject {
    pub fn new(id: UserId, email: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            email: email.into(),
            role,
        }
    }
}
