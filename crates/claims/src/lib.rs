//! Claims on found items.
//!
//! The claim record, its state machine and the access rules of the claims
//! workflow. Everything here is pure; the storage-backed orchestration lives
//! in `lostfound-infra`.
//!
//! ```text
//! NONE ──create──▶ PENDING ──approve──▶ APPROVED   (item: available → claimed,
//!                     │                              sibling PENDING claims → REJECTED)
//!                     └─────reject────▶ REJECTED
//! ```

pub mod claim;
pub mod error;
pub mod rules;

pub use claim::{Claim, ClaimResolution, ClaimStatus};
pub use error::ClaimError;
pub use rules::{
    Actor, ensure_can_delete, ensure_can_resolve, ensure_can_view_claim, ensure_can_view_item_claims,
    ensure_claimable, siblings_to_reject,
};
