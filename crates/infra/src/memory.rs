//! In-memory backend for development and tests.
//!
//! All collections live behind one `RwLock`, so every conditional write
//! (claim insert, approval cascade) is a check-then-act inside a single
//! critical section.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use lostfound_auth::UserAccount;
use lostfound_claims::{Claim, ClaimResolution, ClaimStatus, siblings_to_reject};
use lostfound_core::{ClaimId, ItemId, UserId};
use lostfound_items::{FoundItem, FoundItemStatus, LostItem, LostItemStatus};

use crate::store::{
    ClaimCounts, ClaimStore, FoundItemCounts, FoundItemFilter, ItemStore, LostItemCounts, StoreError, StoreResult,
    UserStore,
};

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, UserAccount>,
    found_items: HashMap<ItemId, FoundItem>,
    lost_items: HashMap<ItemId, LostItem>,
    claims: HashMap<ClaimId, Claim>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }
}

fn newest_first<T>(mut rows: Vec<T>, created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    rows.sort_by_key(|r| std::cmp::Reverse(created_at(r)));
    rows
}

#[async_trait::async_trait]
impl UserStore for InMemoryStore {
    async fn insert_user(&self, user: UserAccount) -> StoreResult<UserAccount> {
        let mut state = self.write()?;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation(format!("email {} already registered", user.email)));
        }
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: UserId) -> StoreResult<Option<UserAccount>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>> {
        Ok(self.read()?.users.values().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, user: &UserAccount) -> StoreResult<()> {
        let mut state = self.write()?;
        let slot = state
            .users
            .get_mut(&user.id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", user.id)))?;
        *slot = user.clone();
        Ok(())
    }

    async fn list_users(&self) -> StoreResult<Vec<UserAccount>> {
        let users = self.read()?.users.values().cloned().collect();
        Ok(newest_first(users, |u: &UserAccount| u.created_at))
    }

    async fn count_users(&self) -> StoreResult<u64> {
        Ok(self.read()?.users.len() as u64)
    }
}

#[async_trait::async_trait]
impl ItemStore for InMemoryStore {
    async fn insert_found_item(&self, item: FoundItem) -> StoreResult<FoundItem> {
        self.write()?.found_items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn find_found_item(&self, id: ItemId) -> StoreResult<Option<FoundItem>> {
        Ok(self.read()?.found_items.get(&id).cloned())
    }

    async fn list_found_items(&self, filter: &FoundItemFilter) -> StoreResult<Vec<FoundItem>> {
        let items = self
            .read()?
            .found_items
            .values()
            .filter(|i| filter.matches(i))
            .cloned()
            .collect();
        Ok(newest_first(items, |i: &FoundItem| i.created_at))
    }

    async fn update_found_item(&self, item: &FoundItem) -> StoreResult<()> {
        let mut state = self.write()?;
        let slot = state
            .found_items
            .get_mut(&item.id)
            .ok_or_else(|| StoreError::NotFound(format!("found item {}", item.id)))?;
        *slot = item.clone();
        Ok(())
    }

    async fn insert_lost_item(&self, item: LostItem) -> StoreResult<LostItem> {
        self.write()?.lost_items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn find_lost_item(&self, id: ItemId) -> StoreResult<Option<LostItem>> {
        Ok(self.read()?.lost_items.get(&id).cloned())
    }

    async fn list_lost_items(&self) -> StoreResult<Vec<LostItem>> {
        let items = self.read()?.lost_items.values().cloned().collect();
        Ok(newest_first(items, |i: &LostItem| i.created_at))
    }

    async fn update_lost_item(&self, item: &LostItem) -> StoreResult<()> {
        let mut state = self.write()?;
        let slot = state
            .lost_items
            .get_mut(&item.id)
            .ok_or_else(|| StoreError::NotFound(format!("lost item {}", item.id)))?;
        *slot = item.clone();
        Ok(())
    }

    async fn count_found_items(&self) -> StoreResult<FoundItemCounts> {
        let state = self.read()?;
        let mut counts = FoundItemCounts::default();
        for item in state.found_items.values() {
            match item.status {
                FoundItemStatus::Available => counts.available += 1,
                FoundItemStatus::Claimed => counts.claimed += 1,
                FoundItemStatus::Returned => counts.returned += 1,
            }
        }
        Ok(counts)
    }

    async fn count_lost_items(&self) -> StoreResult<LostItemCounts> {
        let state = self.read()?;
        let mut counts = LostItemCounts::default();
        for item in state.lost_items.values() {
            match item.status {
                LostItemStatus::Active => counts.active += 1,
                LostItemStatus::Found => counts.found += 1,
                LostItemStatus::Closed => counts.closed += 1,
            }
        }
        Ok(counts)
    }
}

#[async_trait::async_trait]
impl ClaimStore for InMemoryStore {
    async fn find_claim(&self, id: ClaimId) -> StoreResult<Option<Claim>> {
        Ok(self.read()?.claims.get(&id).cloned())
    }

    async fn find_claim_by_pair(&self, found_item_id: ItemId, claimant_id: UserId) -> StoreResult<Option<Claim>> {
        Ok(self
            .read()?
            .claims
            .values()
            .find(|c| c.found_item_id == found_item_id && c.claimant_id == claimant_id)
            .cloned())
    }

    async fn insert_claim(&self, claim: Claim) -> StoreResult<Claim> {
        let mut state = self.write()?;
        if state
            .claims
            .values()
            .any(|c| c.found_item_id == claim.found_item_id && c.claimant_id == claim.claimant_id)
        {
            return Err(StoreError::UniqueViolation(format!(
                "claim by {} on item {} already exists",
                claim.claimant_id, claim.found_item_id
            )));
        }
        let available = state
            .found_items
            .get(&claim.found_item_id)
            .is_some_and(FoundItem::is_available);
        if !available {
            return Err(StoreError::StaleState(format!(
                "found item {} is not available",
                claim.found_item_id
            )));
        }
        state.claims.insert(claim.id, claim.clone());
        Ok(claim)
    }

    async fn approve_claim(&self, id: ClaimId, now: DateTime<Utc>) -> StoreResult<Claim> {
        let mut guard = self.write()?;
        let state = &mut *guard;
        let mut claim = state
            .claims
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("claim {id}")))?;
        let item = state
            .found_items
            .get_mut(&claim.found_item_id)
            .ok_or_else(|| StoreError::NotFound(format!("found item {}", claim.found_item_id)))?;
        if !claim.is_pending() || !item.is_available() {
            return Err(StoreError::StaleState(format!("claim {id} can no longer be approved")));
        }

        item.status = FoundItemStatus::Claimed;
        item.updated_at = now;
        claim
            .resolve(ClaimResolution::Approve, now)
            .map_err(|e| StoreError::StaleState(e.to_string()))?;

        let losers = siblings_to_reject(state.claims.values(), &claim);
        for loser in losers {
            if let Some(c) = state.claims.get_mut(&loser) {
                c.status = ClaimStatus::Rejected;
                c.updated_at = now;
            }
        }
        state.claims.insert(id, claim.clone());
        Ok(claim)
    }

    async fn reject_claim(&self, id: ClaimId, now: DateTime<Utc>) -> StoreResult<Claim> {
        let mut state = self.write()?;
        let claim = state
            .claims
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("claim {id}")))?;
        claim
            .resolve(ClaimResolution::Reject, now)
            .map_err(|e| StoreError::StaleState(e.to_string()))?;
        Ok(claim.clone())
    }

    async fn delete_pending_claim(&self, id: ClaimId) -> StoreResult<()> {
        let mut state = self.write()?;
        match state.claims.get(&id).map(|c| c.status) {
            None => Err(StoreError::NotFound(format!("claim {id}"))),
            Some(status) if status != ClaimStatus::Pending => {
                Err(StoreError::StaleState(format!("claim {id} is {status}")))
            }
            Some(_) => {
                state.claims.remove(&id);
                Ok(())
            }
        }
    }

    async fn list_claims_by_claimant(&self, claimant_id: UserId) -> StoreResult<Vec<Claim>> {
        let claims = self
            .read()?
            .claims
            .values()
            .filter(|c| c.claimant_id == claimant_id)
            .cloned()
            .collect();
        Ok(newest_first(claims, |c: &Claim| c.created_at))
    }

    async fn list_claims_for_owner(&self, owner_id: UserId) -> StoreResult<Vec<Claim>> {
        let state = self.read()?;
        let claims = state
            .claims
            .values()
            .filter(|c| {
                state
                    .found_items
                    .get(&c.found_item_id)
                    .is_some_and(|i| i.owner_id == owner_id)
            })
            .cloned()
            .collect();
        Ok(newest_first(claims, |c: &Claim| c.created_at))
    }

    async fn list_claims_for_item(&self, found_item_id: ItemId) -> StoreResult<Vec<Claim>> {
        let claims = self
            .read()?
            .claims
            .values()
            .filter(|c| c.found_item_id == found_item_id)
            .cloned()
            .collect();
        Ok(newest_first(claims, |c: &Claim| c.created_at))
    }

    async fn count_claims(&self) -> StoreResult<ClaimCounts> {
        let state = self.read()?;
        let mut counts = ClaimCounts::default();
        for claim in state.claims.values() {
            match claim.status {
                ClaimStatus::Pending => counts.pending += 1,
                ClaimStatus::Approved => counts.approved += 1,
                ClaimStatus::Rejected => counts.rejected += 1,
            }
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use lostfound_auth::{NewAccount, UserAccount};
    use lostfound_items::ItemReport;

    fn account(email: &str) -> UserAccount {
        UserAccount::register(
            NewAccount {
                email: email.to_string(),
                name: "Test User".to_string(),
                password_hash: "x".to_string(),
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn found_item(owner: UserId) -> FoundItem {
        let report = ItemReport {
            title: "Calculator".to_string(),
            description: String::new(),
            category: "electronics".to_string(),
            location: "Room 101".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            contact_info: None,
        };
        FoundItem::report(owner, report, Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn duplicate_email_is_a_unique_violation() {
        let store = InMemoryStore::new();
        store.insert_user(account("a@uni.edu")).await.unwrap();
        let err = store.insert_user(account("a@uni.edu")).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
        assert_eq!(store.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn claim_insert_requires_available_item_and_unique_pair() {
        let store = InMemoryStore::new();
        let mut item = store.insert_found_item(found_item(UserId::new())).await.unwrap();
        let claimant = UserId::new();

        let first = Claim::open(item.id, claimant, "mine", Utc::now()).unwrap();
        store.insert_claim(first).await.unwrap();

        let dup = Claim::open(item.id, claimant, "still mine", Utc::now()).unwrap();
        assert!(matches!(store.insert_claim(dup).await, Err(StoreError::UniqueViolation(_))));

        item.status = FoundItemStatus::Returned;
        store.update_found_item(&item).await.unwrap();
        let late = Claim::open(item.id, UserId::new(), "", Utc::now()).unwrap();
        assert!(matches!(store.insert_claim(late).await, Err(StoreError::StaleState(_))));
    }

    #[tokio::test]
    async fn approval_cascades_and_claims_item() {
        let store = InMemoryStore::new();
        let item = store.insert_found_item(found_item(UserId::new())).await.unwrap();
        let a = store
            .insert_claim(Claim::open(item.id, UserId::new(), "", Utc::now()).unwrap())
            .await
            .unwrap();
        let b = store
            .insert_claim(Claim::open(item.id, UserId::new(), "", Utc::now()).unwrap())
            .await
            .unwrap();

        let approved = store.approve_claim(a.id, Utc::now()).await.unwrap();
        assert_eq!(approved.status, ClaimStatus::Approved);
        assert_eq!(
            store.find_claim(b.id).await.unwrap().unwrap().status,
            ClaimStatus::Rejected
        );
        assert_eq!(
            store.find_found_item(item.id).await.unwrap().unwrap().status,
            FoundItemStatus::Claimed
        );

        assert!(matches!(
            store.approve_claim(b.id, Utc::now()).await,
            Err(StoreError::StaleState(_))
        ));
        let counts = store.count_claims().await.unwrap();
        assert_eq!((counts.pending, counts.approved, counts.rejected), (0, 1, 1));
    }

    #[tokio::test]
    async fn only_pending_claims_can_be_deleted() {
        let store = InMemoryStore::new();
        let item = store.insert_found_item(found_item(UserId::new())).await.unwrap();
        let claim = store
            .insert_claim(Claim::open(item.id, UserId::new(), "", Utc::now()).unwrap())
            .await
            .unwrap();
        store.reject_claim(claim.id, Utc::now()).await.unwrap();

        assert!(matches!(
            store.delete_pending_claim(claim.id).await,
            Err(StoreError::StaleState(_))
        ));
        assert!(matches!(
            store.delete_pending_claim(ClaimId::new()).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn found_item_filter_matches_status_and_category() {
        let store = InMemoryStore::new();
        let owner = UserId::new();
        let mut claimed = found_item(owner);
        claimed.status = FoundItemStatus::Claimed;
        store.insert_found_item(found_item(owner)).await.unwrap();
        store.insert_found_item(claimed).await.unwrap();

        let available = FoundItemFilter {
            status: Some(FoundItemStatus::Available),
            category: Some("Electronics".to_string()),
        };
        assert_eq!(store.list_found_items(&available).await.unwrap().len(), 1);

        let books = FoundItemFilter {
            category: Some("books".to_string()),
            ..FoundItemFilter::default()
        };
        assert!(store.list_found_items(&books).await.unwrap().is_empty());
        assert_eq!(store.count_found_items().await.unwrap().claimed, 1);
    }
}
