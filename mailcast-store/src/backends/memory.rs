//! In-memory store backend.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, RwLock},
    time::SystemTime,
};

use async_trait::async_trait;

use crate::{
    StoreError,
    campaign::{Campaign, CampaignStatus, Subscriber, SubscriberStatus},
    record::DeliveryRecord,
    store::{CampaignDirectory, RecordStore},
    types::{IdempotencyKey, RecordId},
};

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<RecordId, DeliveryRecord>,
    by_key: HashMap<IdempotencyKey, RecordId>,
    campaigns: HashMap<String, Campaign>,
    subscribers: Vec<Subscriber>,
    suppressed: HashSet<String>,
}

/// In-memory implementation of both store traits
///
/// Backed by a `HashMap` behind an `RwLock`. Primarily intended for tests
/// and for embedding the engine without a database; the unique-key check in
/// `create` happens under the write lock, so concurrent creators observe
/// the same at-most-once behavior a relational unique constraint gives.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a campaign
    ///
    /// # Panics
    /// Panics if the lock is poisoned.
    #[allow(clippy::unwrap_used)]
    pub fn insert_campaign(&self, campaign: Campaign) {
        self.inner
            .write()
            .unwrap()
            .campaigns
            .insert(campaign.id.clone(), campaign);
    }

    /// Insert a subscriber
    ///
    /// # Panics
    /// Panics if the lock is poisoned.
    #[allow(clippy::unwrap_used)]
    pub fn insert_subscriber(&self, subscriber: Subscriber) {
        self.inner.write().unwrap().subscribers.push(subscriber);
    }

    /// Add an address to the suppression list
    ///
    /// # Panics
    /// Panics if the lock is poisoned.
    #[allow(clippy::unwrap_used)]
    pub fn suppress(&self, email: &str) {
        self.inner
            .write()
            .unwrap()
            .suppressed
            .insert(email.to_ascii_lowercase());
    }

    /// Number of delivery records held
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .records
            .len()
    }

    /// Snapshot of all delivery records, in no particular order
    #[must_use]
    pub fn records(&self) -> Vec<DeliveryRecord> {
        self.inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .records
            .values()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn create(&self, record: DeliveryRecord) -> crate::Result<RecordId> {
        let mut inner = self.inner.write()?;

        if inner.by_key.contains_key(&record.idempotency_key) {
            return Err(StoreError::DuplicateKey(record.idempotency_key));
        }

        let id = record.id.clone();
        inner
            .by_key
            .insert(record.idempotency_key.clone(), id.clone());
        inner.records.insert(id.clone(), record);

        Ok(id)
    }

    async fn read(&self, id: &RecordId) -> crate::Result<DeliveryRecord> {
        self.inner
            .read()?
            .records
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn update(&self, record: &DeliveryRecord) -> crate::Result<()> {
        let mut inner = self.inner.write()?;
        if inner.records.contains_key(&record.id) {
            inner.records.insert(record.id.clone(), record.clone());
            Ok(())
        } else {
            Err(StoreError::NotFound(record.id.clone()))
        }
    }

    async fn find_by_key(&self, key: &IdempotencyKey) -> crate::Result<Option<DeliveryRecord>> {
        let inner = self.inner.read()?;
        Ok(inner
            .by_key
            .get(key)
            .and_then(|id| inner.records.get(id))
            .cloned())
    }

    async fn stale_records(&self, cutoff: SystemTime) -> crate::Result<Vec<DeliveryRecord>> {
        Ok(self
            .inner
            .read()?
            .records
            .values()
            .filter(|record| !record.state.is_terminal() && record.last_activity() < cutoff)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CampaignDirectory for MemoryStore {
    async fn campaign(&self, id: &str) -> crate::Result<Option<Campaign>> {
        Ok(self.inner.read()?.campaigns.get(id).cloned())
    }

    async fn set_campaign_status(&self, id: &str, status: CampaignStatus) -> crate::Result<()> {
        self.inner
            .write()?
            .campaigns
            .get_mut(id)
            .map(|campaign| campaign.status = status)
            .ok_or_else(|| StoreError::CampaignNotFound(id.to_string()))
    }

    async fn active_subscribers(&self) -> crate::Result<Vec<Subscriber>> {
        Ok(self
            .inner
            .read()?
            .subscribers
            .iter()
            .filter(|subscriber| subscriber.status == SubscriberStatus::Active)
            .cloned()
            .collect())
    }

    async fn is_suppressed(&self, email: &str) -> crate::Result<bool> {
        Ok(self
            .inner
            .read()?
            .suppressed
            .contains(&email.to_ascii_lowercase()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::{CampaignSnapshot, DeliveryState};

    fn test_campaign(id: &str) -> Campaign {
        Campaign {
            id: id.to_string(),
            title: format!("Campaign {id}"),
            status: CampaignStatus::Draft,
            snapshot: Some(CampaignSnapshot {
                subject: "Hello".to_string(),
                html: "<p>Hello</p>".to_string(),
                text: "Hello".to_string(),
            }),
        }
    }

    #[tokio::test]
    async fn test_create_and_read() {
        let store = MemoryStore::new();
        let record = DeliveryRecord::new("c1", "s1", "reader@example.com");
        let key = record.idempotency_key.clone();

        let id = store.create(record).await.expect("create should succeed");

        let read = store.read(&id).await.expect("read should succeed");
        assert_eq!(read.id, id);
        assert_eq!(read.state, DeliveryState::Queued);

        let by_key = store.find_by_key(&key).await.unwrap();
        assert_eq!(by_key.map(|r| r.id), Some(id));
    }

    #[tokio::test]
    async fn test_duplicate_key_rejected() {
        let store = MemoryStore::new();
        store
            .create(DeliveryRecord::new("c1", "s1", "reader@example.com"))
            .await
            .expect("first create should succeed");

        let result = store
            .create(DeliveryRecord::new("c1", "s1", "reader@example.com"))
            .await;
        assert!(matches!(result, Err(StoreError::DuplicateKey(_))));
        assert_eq!(store.record_count(), 1);
    }

    #[tokio::test]
    async fn test_update_roundtrip() {
        let store = MemoryStore::new();
        let record = DeliveryRecord::new("c1", "s1", "reader@example.com");
        let id = store.create(record).await.unwrap();

        let mut record = store.read(&id).await.unwrap();
        record.mark_sending(SystemTime::now());
        store.update(&record).await.expect("update should succeed");

        let read = store.read(&id).await.unwrap();
        assert_eq!(read.state, DeliveryState::Sending);
        assert_eq!(read.attempts, 1);
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let store = MemoryStore::new();
        let record = DeliveryRecord::new("c1", "s1", "reader@example.com");
        let result = store.update(&record).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_stale_records_filters_terminal_and_fresh() {
        let store = MemoryStore::new();
        let now = SystemTime::now();

        // Old, stuck in Sending
        let mut stuck = DeliveryRecord::new("c1", "s1", "a@example.com");
        stuck.created_at = now - std::time::Duration::from_secs(3600);
        stuck.mark_sending(now - std::time::Duration::from_secs(3600));
        let stuck_id = store.create(stuck.clone()).await.unwrap();
        store.update(&stuck).await.unwrap();

        // Old but terminal
        let mut done = DeliveryRecord::new("c1", "s2", "b@example.com");
        done.created_at = now - std::time::Duration::from_secs(3600);
        done.mark_sent(now - std::time::Duration::from_secs(3500));
        store.create(done.clone()).await.unwrap();
        store.update(&done).await.unwrap();

        // Fresh
        store
            .create(DeliveryRecord::new("c1", "s3", "c@example.com"))
            .await
            .unwrap();

        let cutoff = now - std::time::Duration::from_secs(600);
        let stale = store.stale_records(cutoff).await.unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].id, stuck_id);
    }

    #[tokio::test]
    async fn test_campaign_directory() {
        let store = MemoryStore::new();
        store.insert_campaign(test_campaign("c1"));

        let campaign = store.campaign("c1").await.unwrap().expect("should exist");
        assert_eq!(campaign.status, CampaignStatus::Draft);
        assert!(store.campaign("missing").await.unwrap().is_none());

        store
            .set_campaign_status("c1", CampaignStatus::Queued)
            .await
            .unwrap();
        let campaign = store.campaign("c1").await.unwrap().unwrap();
        assert_eq!(campaign.status, CampaignStatus::Queued);

        let result = store
            .set_campaign_status("missing", CampaignStatus::Queued)
            .await;
        assert!(matches!(result, Err(StoreError::CampaignNotFound(_))));
    }

    #[tokio::test]
    async fn test_active_subscribers_and_suppression() {
        let store = MemoryStore::new();
        store.insert_subscriber(Subscriber::active("s1", "one@example.com"));
        store.insert_subscriber(Subscriber {
            id: "s2".to_string(),
            email: "two@example.com".to_string(),
            status: SubscriberStatus::Unsubscribed,
        });
        store.insert_subscriber(Subscriber {
            id: "s3".to_string(),
            email: "three@example.com".to_string(),
            status: SubscriberStatus::Bounced,
        });

        let active = store.active_subscribers().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "s1");

        store.suppress("One@Example.COM");
        assert!(store.is_suppressed("one@example.com").await.unwrap());
        assert!(store.is_suppressed("ONE@example.com").await.unwrap());
        assert!(!store.is_suppressed("three@example.com").await.unwrap());
    }
}
