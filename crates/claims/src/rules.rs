//! Access and admissibility rules of the claims workflow.
//!
//! Each check is a pure function over already-loaded records so the store
//! layer can run it inside whatever critical section it holds.

use lostfound_core::{ClaimId, UserId};
use lostfound_items::FoundItem;

use crate::{Claim, ClaimError};

/// The authenticated user acting on a claim, as freshly read from the store.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub is_admin: bool,
}

impl Actor {
    pub fn new(id: UserId, is_admin: bool) -> Self {
        Self { id, is_admin }
    }
}

/// Admission checks for a new claim, in order: item exists, item is
/// available, claimant is not the reporter, no prior claim by this claimant.
pub fn ensure_claimable<'a>(
    item: Option<&'a FoundItem>,
    claimant: UserId,
    existing: Option<&Claim>,
) -> Result<&'a FoundItem, ClaimError> {
    let item = item.ok_or(ClaimError::ItemNotFound)?;
    if !item.is_available() {
        return Err(ClaimError::NoLongerAvailable);
    }
    if item.owner_id == claimant {
        return Err(ClaimError::CannotClaimOwn);
    }
    // Any earlier claim blocks a new one, whatever its status.
    if existing.is_some() {
        return Err(ClaimError::AlreadyClaimed);
    }
    Ok(item)
}

/// Only the item's reporter or an admin may approve/reject, and only while
/// the claim is pending.
pub fn ensure_can_resolve(claim: &Claim, item: &FoundItem, actor: &Actor) -> Result<(), ClaimError> {
    if item.owner_id != actor.id && !actor.is_admin {
        return Err(ClaimError::Forbidden);
    }
    if !claim.is_pending() {
        return Err(ClaimError::NotPending);
    }
    Ok(())
}

/// Only the claimant or an admin may withdraw, and only while pending.
pub fn ensure_can_delete(claim: &Claim, actor: &Actor) -> Result<(), ClaimError> {
    if claim.claimant_id != actor.id && !actor.is_admin {
        return Err(ClaimError::Forbidden);
    }
    if !claim.is_pending() {
        return Err(ClaimError::NotPending);
    }
    Ok(())
}

pub fn ensure_can_view_item_claims(item: &FoundItem, actor: &Actor) -> Result<(), ClaimError> {
    if item.owner_id == actor.id || actor.is_admin {
        Ok(())
    } else {
        Err(ClaimError::Forbidden)
    }
}

/// A single claim is visible to its claimant, the item's reporter and admins.
pub fn ensure_can_view_claim(claim: &Claim, item_owner: UserId, actor: &Actor) -> Result<(), ClaimError> {
    if claim.claimant_id == actor.id || item_owner == actor.id || actor.is_admin {
        Ok(())
    } else {
        Err(ClaimError::Forbidden)
    }
}

/// Pending claims on the same item that must be rejected when `approved` wins.
pub fn siblings_to_reject<'a>(claims: impl IntoIterator<Item = &'a Claim>, approved: &Claim) -> Vec<ClaimId> {
    claims
        .into_iter()
        .filter(|c| c.found_item_id == approved.found_item_id && c.id != approved.id && c.is_pending())
        .map(|c| c.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClaimResolution, ClaimStatus};
    use chrono::{NaiveDate, Utc};
    use lostfound_items::{FoundItemStatus, ItemReport};
    use proptest::prelude::*;

    fn item_of(owner: UserId) -> FoundItem {
        let report = ItemReport {
            title: "Blue umbrella".to_string(),
            description: String::new(),
            category: "accessories".to_string(),
            location: "Library".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            contact_info: None,
        };
        FoundItem::report(owner, report, Utc::now()).unwrap()
    }

    fn claim_on(item: &FoundItem, claimant: UserId) -> Claim {
        Claim::open(item.id, claimant, "mine", Utc::now()).unwrap()
    }

    #[test]
    fn admission_checks_run_in_order() {
        let owner = UserId::new();
        let claimant = UserId::new();
        let mut item = item_of(owner);

        assert_eq!(ensure_claimable(None, claimant, None).unwrap_err(), ClaimError::ItemNotFound);
        assert_eq!(
            ensure_claimable(Some(&item), owner, None).unwrap_err(),
            ClaimError::CannotClaimOwn
        );

        let prior = claim_on(&item, claimant);
        assert_eq!(
            ensure_claimable(Some(&item), claimant, Some(&prior)).unwrap_err(),
            ClaimError::AlreadyClaimed
        );

        // Availability is checked before ownership and duplicates.
        item.status = FoundItemStatus::Claimed;
        assert_eq!(
            ensure_claimable(Some(&item), owner, Some(&prior)).unwrap_err(),
            ClaimError::NoLongerAvailable
        );
    }

    #[test]
    fn rejected_claim_still_blocks_a_new_one() {
        let item = item_of(UserId::new());
        let claimant = UserId::new();
        let mut prior = claim_on(&item, claimant);
        prior.resolve(ClaimResolution::Reject, Utc::now()).unwrap();
        assert_eq!(
            ensure_claimable(Some(&item), claimant, Some(&prior)).unwrap_err(),
            ClaimError::AlreadyClaimed
        );
    }

    #[test]
    fn owner_and_admin_may_resolve() {
        let owner = UserId::new();
        let item = item_of(owner);
        let claim = claim_on(&item, UserId::new());

        assert!(ensure_can_resolve(&claim, &item, &Actor::new(owner, false)).is_ok());
        assert!(ensure_can_resolve(&claim, &item, &Actor::new(UserId::new(), true)).is_ok());
        assert_eq!(
            ensure_can_resolve(&claim, &item, &Actor::new(claim.claimant_id, false)).unwrap_err(),
            ClaimError::Forbidden
        );
    }

    #[test]
    fn resolving_twice_is_refused() {
        let owner = UserId::new();
        let item = item_of(owner);
        let mut claim = claim_on(&item, UserId::new());
        claim.status = ClaimStatus::Approved;
        assert_eq!(
            ensure_can_resolve(&claim, &item, &Actor::new(owner, false)).unwrap_err(),
            ClaimError::NotPending
        );
    }

    #[test]
    fn delete_is_limited_to_pending_claims_of_the_claimant() {
        let item = item_of(UserId::new());
        let claimant = UserId::new();
        let mut claim = claim_on(&item, claimant);

        assert!(ensure_can_delete(&claim, &Actor::new(claimant, false)).is_ok());
        assert_eq!(
            ensure_can_delete(&claim, &Actor::new(item.owner_id, false)).unwrap_err(),
            ClaimError::Forbidden
        );

        claim.status = ClaimStatus::Approved;
        assert_eq!(
            ensure_can_delete(&claim, &Actor::new(claimant, false)).unwrap_err(),
            ClaimError::NotPending
        );
    }

    #[test]
    fn claim_visibility() {
        let owner = UserId::new();
        let item = item_of(owner);
        let claim = claim_on(&item, UserId::new());

        assert!(ensure_can_view_claim(&claim, owner, &Actor::new(owner, false)).is_ok());
        assert!(ensure_can_view_claim(&claim, owner, &Actor::new(claim.claimant_id, false)).is_ok());
        assert!(ensure_can_view_claim(&claim, owner, &Actor::new(UserId::new(), false)).is_err());
        assert!(ensure_can_view_item_claims(&item, &Actor::new(UserId::new(), true)).is_ok());
        assert!(ensure_can_view_item_claims(&item, &Actor::new(claim.claimant_id, false)).is_err());
    }

    #[test]
    fn siblings_exclude_winner_other_items_and_resolved() {
        let item = item_of(UserId::new());
        let other = item_of(UserId::new());
        let winner = claim_on(&item, UserId::new());
        let sibling = claim_on(&item, UserId::new());
        let mut resolved = claim_on(&item, UserId::new());
        resolved.status = ClaimStatus::Rejected;
        let elsewhere = claim_on(&other, UserId::new());

        let all = [winner.clone(), sibling.clone(), resolved, elsewhere];
        assert_eq!(siblings_to_reject(&all, &winner), vec![sibling.id]);
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, ..ProptestConfig::default() })]

        /// Property: a non-owner, non-admin actor can never resolve a claim,
        /// whatever the claim's status.
        #[test]
        fn strangers_never_resolve(status_idx in 0usize..3) {
            let item = item_of(UserId::new());
            let mut claim = claim_on(&item, UserId::new());
            claim.status = [ClaimStatus::Pending, ClaimStatus::Approved, ClaimStatus::Rejected][status_idx];
            let stranger = Actor::new(UserId::new(), false);
            prop_assert_eq!(ensure_can_resolve(&claim, &item, &stranger), Err(ClaimError::Forbidden));
        }

        /// Property: after approval the cascade never selects the winner and
        /// selects every other pending claim on the item.
        #[test]
        fn cascade_selects_all_other_pending(n in 1usize..8) {
            let item = item_of(UserId::new());
            let claims: Vec<Claim> = (0..n).map(|_| claim_on(&item, UserId::new())).collect();
            let losers = siblings_to_reject(&claims, &claims[0]);
            prop_assert_eq!(losers.len(), n - 1);
            prop_assert!(!losers.contains(&claims[0].id));
        }
    }
}
