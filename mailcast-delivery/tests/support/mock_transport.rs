//! Recording mock transport for delivery scenarios
//!
//! Captures every outbound email for verification and can be scripted to
//! fail: either the first N sends (to exercise the retry path) or every
//! send (to exercise dead-lettering).
#![allow(dead_code)] // Test utility module - not all methods used in every test

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU32, Ordering},
};

use async_trait::async_trait;
use mailcast_delivery::{MailTransport, OutboundEmail, TransportError};

/// Mock implementation of [`MailTransport`] for testing
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    sent: Arc<Mutex<Vec<OutboundEmail>>>,
    failures_remaining: Arc<AtomicU32>,
}

impl MockTransport {
    /// A transport that accepts every send
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that fails the first `n` sends, then accepts
    pub fn failing_times(n: u32) -> Self {
        let transport = Self::default();
        transport.failures_remaining.store(n, Ordering::SeqCst);
        transport
    }

    /// A transport that fails every send
    pub fn failing() -> Self {
        Self::failing_times(u32::MAX)
    }

    /// All emails accepted so far
    ///
    /// # Panics
    /// Panics if the mutex is poisoned
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent
            .lock()
            .expect("MockTransport sent mutex poisoned")
            .clone()
    }

    /// Number of emails accepted so far
    ///
    /// # Panics
    /// Panics if the mutex is poisoned
    pub fn sent_count(&self) -> usize {
        self.sent
            .lock()
            .expect("MockTransport sent mutex poisoned")
            .len()
    }
}

#[async_trait]
impl MailTransport for MockTransport {
    async fn send(&self, email: &OutboundEmail) -> Result<(), TransportError> {
        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            if remaining != u32::MAX {
                self.failures_remaining
                    .fetch_sub(1, Ordering::SeqCst);
            }
            return Err(TransportError::Connection(format!(
                "scripted failure delivering to {}",
                email.to
            )));
        }

        self.sent
            .lock()
            .expect("MockTransport sent mutex poisoned")
            .push(email.clone());
        Ok(())
    }
}
