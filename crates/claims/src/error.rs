use thiserror::Error;

/// Expected failures of the claims workflow.
///
/// Closed set: the HTTP boundary maps each variant to a status code through a
/// fixed table.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClaimError {
    #[error("found item not found")]
    ItemNotFound,

    #[error("claim not found")]
    ClaimNotFound,

    #[error("this item is no longer available for claims")]
    NoLongerAvailable,

    #[error("you cannot claim an item you reported")]
    CannotClaimOwn,

    #[error("you have already claimed this item")]
    AlreadyClaimed,

    #[error("you are not allowed to act on this claim")]
    Forbidden,

    #[error("claim is no longer pending")]
    NotPending,

    #[error("validation failed: {0}")]
    Validation(String),
}

impl ClaimError {
    pub fn code(&self) -> &'static str {
        match self {
            ClaimError::ItemNotFound | ClaimError::ClaimNotFound => "not_found",
            ClaimError::NoLongerAvailable => "no_longer_available",
            ClaimError::CannotClaimOwn => "cannot_claim_own",
            ClaimError::AlreadyClaimed => "already_claimed",
            ClaimError::Forbidden => "forbidden",
            ClaimError::NotPending => "claim_not_pending",
            ClaimError::Validation(_) => "validation_error",
        }
    }
}
