//! Lost/found item records.
//!
//! Report validation and status transitions, as deterministic domain logic
//! (no IO, no HTTP, no storage).

pub mod item;
pub mod status;

pub use item::{FoundItem, ItemReport, LostItem};
pub use status::{FoundItemStatus, LostItemStatus, UnknownStatus};
