//! Repository traits shared by the in-memory and PostgreSQL backends.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use lostfound_auth::UserAccount;
use lostfound_claims::Claim;
use lostfound_core::{ClaimId, ItemId, UserId};
use lostfound_items::{FoundItem, FoundItemStatus, LostItem};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write (duplicate email, duplicate claim pair).
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A conditional write found the row in a different state than required.
    #[error("stale state: {0}")]
    StaleState(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FoundItemFilter {
    pub status: Option<FoundItemStatus>,
    pub category: Option<String>,
}

impl FoundItemFilter {
    pub fn matches(&self, item: &FoundItem) -> bool {
        self.status.is_none_or(|s| item.status == s)
            && self
                .category
                .as_deref()
                .is_none_or(|c| item.report.category.eq_ignore_ascii_case(c))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FoundItemCounts {
    pub available: u64,
    pub claimed: u64,
    pub returned: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LostItemCounts {
    pub active: u64,
    pub found: u64,
    pub closed: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClaimCounts {
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
}

#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new account. Duplicate email → [`StoreError::UniqueViolation`].
    async fn insert_user(&self, user: UserAccount) -> StoreResult<UserAccount>;

    async fn find_user(&self, id: UserId) -> StoreResult<Option<UserAccount>>;

    /// Lookup by normalized (lowercased) email.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>>;

    /// Persist role and status flags of an existing account.
    async fn update_user(&self, user: &UserAccount) -> StoreResult<()>;

    async fn list_users(&self) -> StoreResult<Vec<UserAccount>>;

    async fn count_users(&self) -> StoreResult<u64>;
}

#[async_trait::async_trait]
pub trait ItemStore: Send + Sync {
    async fn insert_found_item(&self, item: FoundItem) -> StoreResult<FoundItem>;

    async fn find_found_item(&self, id: ItemId) -> StoreResult<Option<FoundItem>>;

    /// Newest first.
    async fn list_found_items(&self, filter: &FoundItemFilter) -> StoreResult<Vec<FoundItem>>;

    async fn update_found_item(&self, item: &FoundItem) -> StoreResult<()>;

    async fn insert_lost_item(&self, item: LostItem) -> StoreResult<LostItem>;

    async fn find_lost_item(&self, id: ItemId) -> StoreResult<Option<LostItem>>;

    /// Newest first.
    async fn list_lost_items(&self) -> StoreResult<Vec<LostItem>>;

    async fn update_lost_item(&self, item: &LostItem) -> StoreResult<()>;

    async fn count_found_items(&self) -> StoreResult<FoundItemCounts>;

    async fn count_lost_items(&self) -> StoreResult<LostItemCounts>;
}

/// Claim persistence. The write operations are the atomic units of the
/// claims workflow; each one re-checks its precondition inside the backend's
/// critical section.
#[async_trait::async_trait]
pub trait ClaimStore: Send + Sync {
    async fn find_claim(&self, id: ClaimId) -> StoreResult<Option<Claim>>;

    async fn find_claim_by_pair(&self, found_item_id: ItemId, claimant_id: UserId) -> StoreResult<Option<Claim>>;

    /// Insert a pending claim.
    ///
    /// - pair already present → [`StoreError::UniqueViolation`]
    /// - item missing or not available → [`StoreError::StaleState`]
    async fn insert_claim(&self, claim: Claim) -> StoreResult<Claim>;

    /// Approve a pending claim, mark its item claimed and reject every other
    /// pending claim on that item, as one unit. A claim that is no longer
    /// pending or an item that is no longer available → [`StoreError::StaleState`].
    async fn approve_claim(&self, id: ClaimId, now: DateTime<Utc>) -> StoreResult<Claim>;

    /// Reject a pending claim. Not pending → [`StoreError::StaleState`].
    async fn reject_claim(&self, id: ClaimId, now: DateTime<Utc>) -> StoreResult<Claim>;

    /// Delete a pending claim. Not pending → [`StoreError::StaleState`].
    async fn delete_pending_claim(&self, id: ClaimId) -> StoreResult<()>;

    /// Claims filed by `claimant_id`, newest first.
    async fn list_claims_by_claimant(&self, claimant_id: UserId) -> StoreResult<Vec<Claim>>;

    /// Claims on items reported by `owner_id`, newest first.
    async fn list_claims_for_owner(&self, owner_id: UserId) -> StoreResult<Vec<Claim>>;

    async fn list_claims_for_item(&self, found_item_id: ItemId) -> StoreResult<Vec<Claim>>;

    async fn count_claims(&self) -> StoreResult<ClaimCounts>;
}
