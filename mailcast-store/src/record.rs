//! The durable per-recipient delivery record.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::types::{DeliveryState, IdempotencyKey, RecordId};

/// Durable record of one (campaign, subscriber) delivery
///
/// Created exactly once per pair at admission time and never deleted by the
/// queue core. The record carries the retry audit trail and is the only
/// cross-process-safe view of a delivery's fate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRecord {
    /// Unique record identifier, mirrored by the transient queue job
    pub id: RecordId,
    /// Campaign this delivery belongs to
    pub campaign_id: String,
    /// Subscriber being targeted
    pub subscriber_id: String,
    /// Recipient address at admission time
    pub email: String,
    /// Deterministic admission key; unique per (campaign, subscriber)
    pub idempotency_key: IdempotencyKey,
    /// Current lifecycle state
    pub state: DeliveryState,
    /// Number of delivery attempts started so far
    pub attempts: u32,
    /// When the most recent attempt started
    pub last_attempt_at: Option<SystemTime>,
    /// Message from the most recent failure
    pub last_error: Option<String>,
    /// When delivery succeeded
    pub delivered_at: Option<SystemTime>,
    /// When the record was admitted
    pub created_at: SystemTime,
}

impl DeliveryRecord {
    /// Create a new `Queued` record for a (campaign, subscriber) pair.
    ///
    /// Computes the idempotency key from the pair; the store's unique
    /// constraint on that key is what guards against duplicate admission.
    #[must_use]
    pub fn new(campaign_id: &str, subscriber_id: &str, email: &str) -> Self {
        Self {
            id: RecordId::generate(),
            campaign_id: campaign_id.to_string(),
            subscriber_id: subscriber_id.to_string(),
            email: email.to_string(),
            idempotency_key: IdempotencyKey::for_pair(campaign_id, subscriber_id),
            state: DeliveryState::Queued,
            attempts: 0,
            last_attempt_at: None,
            last_error: None,
            delivered_at: None,
            created_at: SystemTime::now(),
        }
    }

    /// Begin a delivery attempt: transition to `Sending` and count it.
    pub fn mark_sending(&mut self, at: SystemTime) {
        self.state = DeliveryState::Sending;
        self.attempts = self.attempts.saturating_add(1);
        self.last_attempt_at = Some(at);
    }

    /// Record a successful delivery.
    pub fn mark_sent(&mut self, at: SystemTime) {
        self.state = DeliveryState::Sent;
        self.delivered_at = Some(at);
        self.last_error = None;
    }

    /// Dead-letter the record with the final error message.
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.state = DeliveryState::Failed;
        self.last_error = Some(error.into());
    }

    /// Put an interrupted record back in line for the queue.
    ///
    /// Used by the recovery sweep for records stuck in `Sending` after a
    /// crash; terminal states are left untouched by the caller.
    pub fn mark_queued(&mut self) {
        self.state = DeliveryState::Queued;
    }

    /// The instant this record was last touched by the delivery machinery.
    #[must_use]
    pub fn last_activity(&self) -> SystemTime {
        self.last_attempt_at.unwrap_or(self.created_at)
    }
}
