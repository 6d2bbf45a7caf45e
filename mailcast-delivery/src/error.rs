//! Typed error handling for delivery operations.
//!
//! Admission errors (store failures) propagate to the caller. Transport
//! failures are never surfaced synchronously; the processor turns them into
//! retries or a dead-letter. Throttle contention is not an error at all.

use thiserror::Error;

use mailcast_store::StoreError;

/// Top-level delivery error type.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The durable record store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The outbound transport rejected or failed a send.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Content compilation failed for a recipient.
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// The campaign does not exist.
    #[error("Campaign not found: {0}")]
    CampaignNotFound(String),

    /// The campaign exists but carries no frozen content snapshot.
    #[error("Campaign has no content snapshot: {0}")]
    MissingSnapshot(String),
}

/// Errors from the outbound mail transport.
///
/// The processor treats all of these as retryable up to the attempt budget;
/// the variants exist for diagnostics and for the record's `last_error`.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failed to reach the provider at all.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The provider did not respond in time.
    #[error("Send timed out: {0}")]
    Timeout(String),

    /// The provider refused the message.
    #[error("Message rejected: {0}")]
    Rejected(String),
}

/// Content compilation failure for a (campaign, recipient) pair.
#[derive(Debug, Error)]
#[error("Template render failed: {0}")]
pub struct RenderError(pub String);

/// Specialized `Result` type for delivery operations.
pub type Result<T> = std::result::Result<T, DeliveryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_conversion() {
        let store_err = StoreError::Internal("connection pool exhausted".to_string());
        let err: DeliveryError = store_err.into();
        assert!(matches!(err, DeliveryError::Store(_)));
        assert!(err.to_string().contains("connection pool exhausted"));
    }

    #[test]
    fn test_transport_error_display() {
        let err = DeliveryError::from(TransportError::Rejected("450 mailbox busy".to_string()));
        assert_eq!(
            err.to_string(),
            "Transport error: Message rejected: 450 mailbox busy"
        );
    }

    #[test]
    fn test_render_error_display() {
        let err = DeliveryError::from(RenderError("missing snapshot".to_string()));
        assert_eq!(
            err.to_string(),
            "Render error: Template render failed: missing snapshot"
        );
    }
}
