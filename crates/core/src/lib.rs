//! `lostfound-core`: shared domain primitives.
//!
//! Typed identifiers and the domain error model. No IO, no HTTP.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{ClaimId, ItemId, UserId};
