//! Type definitions for the delivery queue and processor

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use mailcast_store::RecordId;

/// What kind of work a queue job represents
///
/// Only email sends exist today; the enum leaves room for other job types
/// (digest assembly, webhook fanout) without changing the queue surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobKind {
    /// Deliver one campaign email to one subscriber
    SendEmail,
}

/// A transient, process-local unit of work
///
/// Mirrors a durable delivery record by id. Jobs live only in memory: on a
/// crash they are lost, and the recovery sweep re-admits them from the
/// records left behind in `Queued`/`Sending`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueJob {
    /// Id of the backing delivery record
    pub id: RecordId,
    /// Kind of work
    pub kind: JobKind,
    /// Campaign being delivered
    pub campaign_id: String,
    /// Targeted subscriber
    pub subscriber_id: String,
    /// Recipient address
    pub email: String,
    /// Failed attempts so far (the queue's view; the record keeps the audit trail)
    pub attempts: u32,
    /// Attempt budget before dead-lettering
    pub max_attempts: u32,
    /// When the job was admitted
    pub created_at: SystemTime,
    /// Earliest time the job may be dispatched
    pub process_at: SystemTime,
}

/// Point-in-time partition of the jobs held by a queue backend
///
/// The four buckets partition `total`: every job is exactly one of ready,
/// processing (leased), delayed (scheduled in the future) or failed (at the
/// attempt cap, awaiting removal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct QueueCounts {
    /// All jobs held in the backend
    pub total: usize,
    /// Dispatchable now
    pub ready: usize,
    /// Currently leased by a processor
    pub processing: usize,
    /// Waiting for their `process_at`
    pub delayed: usize,
    /// At the attempt cap
    pub failed: usize,
}

/// Queue counts plus throttle visibility, as exposed to operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    /// All jobs held in the backend
    pub total: usize,
    /// Dispatchable now
    pub ready: usize,
    /// Currently leased by a processor
    pub processing: usize,
    /// Waiting for their `process_at`
    pub delayed: usize,
    /// At the attempt cap
    pub failed: usize,
    /// Number of domains with an active throttle window
    pub tracked_domains: usize,
}

/// Ready-to-send content for one recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledEmail {
    /// Subject line
    pub subject: String,
    /// HTML body
    pub html: String,
    /// Plain-text alternative
    pub text: String,
}

/// One outbound transmission handed to the transport
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    /// Recipient address
    pub to: String,
    /// Campaign this send belongs to, for transport-side tagging
    pub campaign_id: String,
    /// Compiled content
    pub content: CompiledEmail,
}
