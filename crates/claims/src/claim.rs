use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lostfound_core::{ClaimId, ItemId, UserId};

use crate::ClaimError;

const MAX_DETAILS_LEN: usize = 1000;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ClaimStatus::Pending)
    }
}

impl FromStr for ClaimStatus {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ClaimStatus::Pending),
            "approved" => Ok(ClaimStatus::Approved),
            "rejected" => Ok(ClaimStatus::Rejected),
            other => Err(ClaimError::Validation(format!("unknown claim status '{other}'"))),
        }
    }
}

impl core::fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome an item owner can choose for a pending claim.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ClaimResolution {
    Approve,
    Reject,
}

impl ClaimResolution {
    /// Parse the wire value: only `approved` / `rejected` are accepted.
    pub fn parse(status: &str) -> Result<Self, ClaimError> {
        match status {
            "approved" => Ok(ClaimResolution::Approve),
            "rejected" => Ok(ClaimResolution::Reject),
            _ => Err(ClaimError::Validation(
                "status must be one of: approved, rejected".to_string(),
            )),
        }
    }

    pub fn target_status(&self) -> ClaimStatus {
        match self {
            ClaimResolution::Approve => ClaimStatus::Approved,
            ClaimResolution::Reject => ClaimStatus::Rejected,
        }
    }
}

/// A claimant's assertion of ownership over a found item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    pub found_item_id: ItemId,
    pub claimant_id: UserId,
    pub status: ClaimStatus,
    /// Proof of ownership supplied by the claimant.
    pub details: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Claim {
    /// New pending claim. Admissibility is checked by [`crate::ensure_claimable`].
    pub fn open(
        found_item_id: ItemId,
        claimant_id: UserId,
        details: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, ClaimError> {
        let details = details.trim();
        if details.chars().count() > MAX_DETAILS_LEN {
            return Err(ClaimError::Validation(format!(
                "details must be at most {MAX_DETAILS_LEN} characters"
            )));
        }
        Ok(Self {
            id: ClaimId::new(),
            found_item_id,
            claimant_id,
            status: ClaimStatus::Pending,
            details: details.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.status == ClaimStatus::Pending
    }

    /// PENDING → APPROVED | REJECTED.
    pub fn resolve(&mut self, resolution: ClaimResolution, now: DateTime<Utc>) -> Result<(), ClaimError> {
        if !self.is_pending() {
            return Err(ClaimError::NotPending);
        }
        self.status = resolution.target_status();
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> Claim {
        Claim::open(ItemId::new(), UserId::new(), " it has my initials ", Utc::now()).unwrap()
    }

    #[test]
    fn open_claim_is_pending_and_trimmed() {
        let c = pending();
        assert_eq!(c.status, ClaimStatus::Pending);
        assert_eq!(c.details, "it has my initials");
    }

    #[test]
    fn overlong_details_are_rejected() {
        let details = "x".repeat(MAX_DETAILS_LEN + 1);
        assert!(matches!(
            Claim::open(ItemId::new(), UserId::new(), &details, Utc::now()),
            Err(ClaimError::Validation(_))
        ));
    }

    #[test]
    fn resolved_claims_are_terminal() {
        let mut c = pending();
        c.resolve(ClaimResolution::Reject, Utc::now()).unwrap();
        assert_eq!(c.status, ClaimStatus::Rejected);
        assert_eq!(c.resolve(ClaimResolution::Approve, Utc::now()), Err(ClaimError::NotPending));
        assert!(c.status.is_terminal());
    }

    #[test]
    fn only_approved_and_rejected_parse_as_resolutions() {
        assert_eq!(ClaimResolution::parse("approved"), Ok(ClaimResolution::Approve));
        assert_eq!(ClaimResolution::parse("rejected"), Ok(ClaimResolution::Reject));
        for bad in ["pending", "APPROVED", ""] {
            assert!(ClaimResolution::parse(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn status_wire_names() {
        assert_eq!(serde_json::to_value(ClaimStatus::Approved).unwrap(), "approved");
        assert_eq!("rejected".parse::<ClaimStatus>().unwrap(), ClaimStatus::Rejected);
    }
}
