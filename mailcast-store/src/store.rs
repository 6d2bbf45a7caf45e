//! Store traits the queue core is written against.
//!
//! Production deployments implement these over the application's relational
//! store; [`crate::MemoryStore`] implements both for tests and embedding.

use std::time::SystemTime;

use async_trait::async_trait;

use crate::{
    campaign::{Campaign, CampaignStatus, Subscriber},
    record::DeliveryRecord,
    types::{IdempotencyKey, RecordId},
};

/// Persistent keyed store of delivery records
///
/// The unique constraint on the idempotency key is the load-bearing part of
/// this contract: [`RecordStore::create`] must fail with
/// [`crate::StoreError::DuplicateKey`] if a record for the key already
/// exists, atomically with respect to concurrent creators.
#[async_trait]
pub trait RecordStore: Send + Sync + std::fmt::Debug {
    /// Persist a new record.
    ///
    /// # Errors
    /// `DuplicateKey` if a record with the same idempotency key exists;
    /// `Internal` on backend failure.
    async fn create(&self, record: DeliveryRecord) -> crate::Result<RecordId>;

    /// Read a record by id.
    ///
    /// # Errors
    /// `NotFound` if the record does not exist.
    async fn read(&self, id: &RecordId) -> crate::Result<DeliveryRecord>;

    /// Persist updated state/attempt fields for an existing record.
    ///
    /// # Errors
    /// `NotFound` if the record does not exist.
    async fn update(&self, record: &DeliveryRecord) -> crate::Result<()>;

    /// Look up a record by its idempotency key.
    ///
    /// # Errors
    /// `Internal` on backend failure.
    async fn find_by_key(&self, key: &IdempotencyKey) -> crate::Result<Option<DeliveryRecord>>;

    /// Non-terminal records whose last activity predates `cutoff`.
    ///
    /// Feeds the recovery sweep: after a crash, `Queued`/`Sending` records
    /// with no live queue job show up here once they go stale.
    ///
    /// # Errors
    /// `Internal` on backend failure.
    async fn stale_records(&self, cutoff: SystemTime) -> crate::Result<Vec<DeliveryRecord>>;
}

/// Read access to campaigns, subscribers and the suppression list
#[async_trait]
pub trait CampaignDirectory: Send + Sync + std::fmt::Debug {
    /// Fetch a campaign by id, or `None` if it does not exist.
    ///
    /// # Errors
    /// `Internal` on backend failure.
    async fn campaign(&self, id: &str) -> crate::Result<Option<Campaign>>;

    /// Update a campaign's status.
    ///
    /// # Errors
    /// `CampaignNotFound` if the campaign does not exist.
    async fn set_campaign_status(&self, id: &str, status: CampaignStatus) -> crate::Result<()>;

    /// All subscribers currently eligible to receive campaign mail.
    ///
    /// Only `Active` subscribers are returned; suppression is a separate
    /// check because the list is keyed by address, not subscriber id.
    ///
    /// # Errors
    /// `Internal` on backend failure.
    async fn active_subscribers(&self) -> crate::Result<Vec<Subscriber>>;

    /// Whether an address is on the suppression list (bounce/complaint).
    ///
    /// # Errors
    /// `Internal` on backend failure.
    async fn is_suppressed(&self, email: &str) -> crate::Result<bool>;
}
