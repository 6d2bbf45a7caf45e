//! Identifier and state types for delivery records.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Identifier for a delivery record
///
/// A globally unique identifier (ULID) that doubles as the handle for the
/// transient queue job mirroring the record. ULIDs are lexicographically
/// sortable by creation time and collision-resistant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId {
    id: ulid::Ulid,
}

impl RecordId {
    /// Create a record ID from a ULID
    #[must_use]
    pub const fn new(id: ulid::Ulid) -> Self {
        Self { id }
    }

    /// Generate a new unique record ID
    #[must_use]
    pub fn generate() -> Self {
        Self {
            id: ulid::Ulid::new(),
        }
    }

    /// Get the underlying ULID
    #[must_use]
    pub const fn ulid(&self) -> ulid::Ulid {
        self.id
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl serde::Serialize for RecordId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.id.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let id = ulid::Ulid::from_string(&s).map_err(serde::de::Error::custom)?;
        Ok(Self { id })
    }
}

/// Deterministic admission key for a (campaign, subscriber) pair
///
/// The key is the lowercase hex SHA-256 of `"{campaign_id}:{subscriber_id}"`.
/// The store enforces a unique constraint on it, which is what makes
/// admission at-most-once even under retried or concurrent enqueue calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Compute the key for a (campaign, subscriber) pair.
    ///
    /// The same pair always yields the same key.
    #[must_use]
    pub fn for_pair(campaign_id: &str, subscriber_id: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(campaign_id.as_bytes());
        hasher.update(b":");
        hasher.update(subscriber_id.as_bytes());
        let digest = hasher.finalize();

        let mut key = String::with_capacity(digest.len() * 2);
        for byte in digest {
            let _ = write!(key, "{byte:02x}");
        }

        Self(key)
    }

    /// Get the key as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a delivery record
///
/// Transitions are `Queued -> Sending -> Sent` on success, or
/// `Queued -> Sending -> Failed` once the retry budget is exhausted.
/// Terminal records are never revisited by the queue core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryState {
    /// Admitted, awaiting dispatch
    Queued,
    /// A delivery attempt is in progress (or was interrupted by a crash)
    Sending,
    /// Delivered to the transport successfully
    Sent,
    /// Retry budget exhausted; dead-lettered
    Failed,
}

impl DeliveryState {
    /// Whether this state ends the record's lifecycle
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Sent | Self::Failed)
    }
}

impl std::fmt::Display for DeliveryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Queued => "queued",
            Self::Sending => "sending",
            Self::Sent => "sent",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}
