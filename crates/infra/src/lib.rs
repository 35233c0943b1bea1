//! Infrastructure layer: persistence backends and the storage-backed claims
//! workflow.

pub mod memory;
pub mod postgres;
pub mod store;
pub mod workflow;

pub use memory::InMemoryStore;
pub use postgres::{PostgresStore, ensure_schema};
pub use store::{
    ClaimCounts, ClaimStore, FoundItemCounts, FoundItemFilter, ItemStore, LostItemCounts, StoreError, StoreResult,
    UserStore,
};
pub use workflow::{ClaimsWorkflow, WorkflowError};
