//! Error types for store operations.

use thiserror::Error;

use crate::types::{IdempotencyKey, RecordId};

/// Top-level store error type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Record not found in the store.
    #[error("Record not found: {0}")]
    NotFound(RecordId),

    /// A record with this idempotency key already exists.
    ///
    /// This is the unique-constraint violation admission relies on:
    /// the caller should re-read by key and use the existing record.
    #[error("Record already exists for idempotency key {0}")]
    DuplicateKey(IdempotencyKey),

    /// Campaign not found in the directory.
    #[error("Campaign not found: {0}")]
    CampaignNotFound(String),

    /// Internal error (lock poisoning, backend connectivity, etc.).
    #[error("Internal store error: {0}")]
    Internal(String),
}

/// Specialized `Result` type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

// Convenience conversion for lock poisoning
impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Self::Internal(format!("Lock poisoned: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_key_display() {
        let key = IdempotencyKey::for_pair("c1", "s1");
        let err = StoreError::DuplicateKey(key.clone());
        assert!(err.to_string().contains(key.as_str()));
    }

    #[test]
    fn test_not_found_display() {
        let id = RecordId::generate();
        let err = StoreError::NotFound(id.clone());
        assert!(err.to_string().contains(&id.to_string()));
    }
}
