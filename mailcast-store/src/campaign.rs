//! Campaign and subscriber records as seen by the queue core.
//!
//! The surrounding application owns these tables; the queue only reads them
//! (and flips a campaign to `Queued` once its recipients are admitted), so
//! the shapes here carry just the fields delivery needs.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a campaign, as far as delivery is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CampaignStatus {
    /// Being edited; not eligible for queueing
    Draft,
    /// Recipients admitted to the delivery queue
    Queued,
    /// Aggregate reporting has reconciled all deliveries
    Sent,
}

/// Frozen copy of campaign content taken before sending
///
/// Every recipient sees this snapshot regardless of later edits to the
/// campaign itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignSnapshot {
    /// Subject line
    pub subject: String,
    /// HTML body
    pub html: String,
    /// Plain-text alternative
    pub text: String,
}

/// A campaign eligible for delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    /// Campaign identifier (owned by the application)
    pub id: String,
    /// Human-readable title, for logging only
    pub title: String,
    /// Current status
    pub status: CampaignStatus,
    /// Content snapshot; a campaign without one cannot be queued
    pub snapshot: Option<CampaignSnapshot>,
}

/// Subscription state of a recipient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriberStatus {
    /// Receives campaign mail
    Active,
    /// Opted out
    Unsubscribed,
    /// Address bounced permanently
    Bounced,
}

/// A recipient of campaign mail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscriber {
    /// Subscriber identifier (owned by the application)
    pub id: String,
    /// Mailbox address
    pub email: String,
    /// Subscription state; only `Active` subscribers are enqueued
    pub status: SubscriberStatus,
}

impl Subscriber {
    /// Convenience constructor for an active subscriber.
    #[must_use]
    pub fn active(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            status: SubscriberStatus::Active,
        }
    }
}
