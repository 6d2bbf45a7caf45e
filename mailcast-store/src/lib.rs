//! Durable delivery-record store boundary.
//!
//! The queue core treats this crate as its source of truth: a delivery
//! record exists for every admitted (campaign, subscriber) pair, keyed by a
//! deterministic idempotency key, and survives process restarts. The
//! in-memory job queue in `mailcast-delivery` is a performance cache over
//! these records, never an independent ledger.

pub mod backends;
pub mod campaign;
pub mod error;
pub mod record;
pub mod store;
pub mod types;

pub use backends::MemoryStore;
pub use campaign::{Campaign, CampaignSnapshot, CampaignStatus, Subscriber, SubscriberStatus};
pub use error::{Result, StoreError};
pub use record::DeliveryRecord;
pub use store::{CampaignDirectory, RecordStore};
pub use types::{DeliveryState, IdempotencyKey, RecordId};
