//! Claims workflow orchestration.
//!
//! ```text
//! request (acting user id)
//!   ↓
//! 1. Fresh lookup of the acting account (admin = enabled account with admin role)
//!   ↓
//! 2. Load claim / found item
//!   ↓
//! 3. Pure rule check (lostfound-claims)
//!   ↓
//! 4. Conditional store write (re-checks its precondition atomically)
//! ```
//!
//! Step 3 gives precise error codes; step 4 is what actually guarantees the
//! invariants when requests race. A store-level conflict discovered in step 4
//! is mapped back to the claim error the rule check would have produced.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, instrument};

use lostfound_claims::{
    Actor, Claim, ClaimError, ClaimResolution, ensure_can_delete, ensure_can_resolve, ensure_can_view_claim,
    ensure_can_view_item_claims, ensure_claimable,
};
use lostfound_core::{ClaimId, ItemId, UserId};
use lostfound_items::FoundItem;

use crate::store::{ClaimStore, ItemStore, StoreError, UserStore};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Claim(#[from] ClaimError),

    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

/// Map the conflicts a conditional claim write can report.
fn map_conflict(err: StoreError, on_unique: ClaimError, on_stale: ClaimError) -> WorkflowError {
    match err {
        StoreError::UniqueViolation(_) => WorkflowError::Claim(on_unique),
        StoreError::StaleState(_) => WorkflowError::Claim(on_stale),
        StoreError::NotFound(_) => WorkflowError::Claim(ClaimError::ClaimNotFound),
        other => WorkflowError::Store(other),
    }
}

#[derive(Clone)]
pub struct ClaimsWorkflow {
    users: Arc<dyn UserStore>,
    items: Arc<dyn ItemStore>,
    claims: Arc<dyn ClaimStore>,
}

impl ClaimsWorkflow {
    pub fn new(users: Arc<dyn UserStore>, items: Arc<dyn ItemStore>, claims: Arc<dyn ClaimStore>) -> Self {
        Self { users, items, claims }
    }

    async fn actor(&self, user_id: UserId) -> Result<Actor, WorkflowError> {
        let is_admin = self
            .users
            .find_user(user_id)
            .await?
            .is_some_and(|u| u.is_enabled() && u.role.is_admin());
        Ok(Actor::new(user_id, is_admin))
    }

    async fn found_item(&self, id: ItemId) -> Result<FoundItem, WorkflowError> {
        self.items
            .find_found_item(id)
            .await?
            .ok_or(WorkflowError::Claim(ClaimError::ItemNotFound))
    }

    async fn claim(&self, id: ClaimId) -> Result<Claim, WorkflowError> {
        self.claims
            .find_claim(id)
            .await?
            .ok_or(WorkflowError::Claim(ClaimError::ClaimNotFound))
    }

    #[instrument(skip(self, details), fields(claimant_id = %claimant_id, item_id = %found_item_id), err)]
    pub async fn create_claim(
        &self,
        claimant_id: UserId,
        found_item_id: ItemId,
        details: &str,
    ) -> Result<Claim, WorkflowError> {
        let item = self.items.find_found_item(found_item_id).await?;
        let existing = self.claims.find_claim_by_pair(found_item_id, claimant_id).await?;
        ensure_claimable(item.as_ref(), claimant_id, existing.as_ref())?;

        let claim = Claim::open(found_item_id, claimant_id, details, Utc::now())?;
        let claim = self
            .claims
            .insert_claim(claim)
            .await
            .map_err(|e| map_conflict(e, ClaimError::AlreadyClaimed, ClaimError::NoLongerAvailable))?;

        info!(claim_id = %claim.id, "claim created");
        Ok(claim)
    }

    #[instrument(skip(self), fields(claim_id = %claim_id, actor_id = %acting_user), err)]
    pub async fn update_claim_status(
        &self,
        claim_id: ClaimId,
        acting_user: UserId,
        resolution: ClaimResolution,
    ) -> Result<Claim, WorkflowError> {
        let claim = self.claim(claim_id).await?;
        let item = self.found_item(claim.found_item_id).await?;
        let actor = self.actor(acting_user).await?;
        ensure_can_resolve(&claim, &item, &actor)?;

        let now = Utc::now();
        let updated = match resolution {
            ClaimResolution::Approve => self.claims.approve_claim(claim_id, now).await,
            ClaimResolution::Reject => self.claims.reject_claim(claim_id, now).await,
        }
        .map_err(|e| map_conflict(e, ClaimError::NotPending, ClaimError::NotPending))?;

        info!(status = %updated.status, item_id = %item.id, "claim resolved");
        Ok(updated)
    }

    #[instrument(skip(self), fields(claim_id = %claim_id, actor_id = %acting_user), err)]
    pub async fn delete_claim(&self, claim_id: ClaimId, acting_user: UserId) -> Result<(), WorkflowError> {
        let claim = self.claim(claim_id).await?;
        let actor = self.actor(acting_user).await?;
        ensure_can_delete(&claim, &actor)?;

        self.claims
            .delete_pending_claim(claim_id)
            .await
            .map_err(|e| map_conflict(e, ClaimError::NotPending, ClaimError::NotPending))?;

        info!("claim withdrawn");
        Ok(())
    }

    pub async fn list_claims_made(&self, user_id: UserId) -> Result<Vec<Claim>, WorkflowError> {
        Ok(self.claims.list_claims_by_claimant(user_id).await?)
    }

    pub async fn list_claims_received(&self, user_id: UserId) -> Result<Vec<Claim>, WorkflowError> {
        Ok(self.claims.list_claims_for_owner(user_id).await?)
    }

    #[instrument(skip(self), fields(item_id = %found_item_id, actor_id = %requesting_user), err)]
    pub async fn list_claims_for_item(
        &self,
        found_item_id: ItemId,
        requesting_user: UserId,
    ) -> Result<Vec<Claim>, WorkflowError> {
        let item = self.found_item(found_item_id).await?;
        let actor = self.actor(requesting_user).await?;
        ensure_can_view_item_claims(&item, &actor)?;
        Ok(self.claims.list_claims_for_item(found_item_id).await?)
    }

    pub async fn get_claim(&self, claim_id: ClaimId, requesting_user: UserId) -> Result<Claim, WorkflowError> {
        let claim = self.claim(claim_id).await?;
        let item = self.found_item(claim.found_item_id).await?;
        let actor = self.actor(requesting_user).await?;
        ensure_can_view_claim(&claim, item.owner_id, &actor)?;
        Ok(claim)
    }
}
