//! Store backend implementations
//!
//! Only an in-memory backend lives in-tree; production deployments
//! implement [`crate::RecordStore`] and [`crate::CampaignDirectory`] over
//! the application's own database.

pub mod memory;

pub use memory::MemoryStore;
