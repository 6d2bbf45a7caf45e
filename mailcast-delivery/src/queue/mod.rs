//! Queue backend abstraction
//!
//! The processor's logic (throttling, backoff, dead-lettering) is written
//! against this trait rather than a concrete holding area, so the in-memory
//! queue used in tests and single-process deployments can be swapped for a
//! durable broker without touching the processor.

pub mod memory;

use std::time::SystemTime;

use async_trait::async_trait;

use mailcast_store::RecordId;

use crate::types::{QueueCounts, QueueJob};

pub use memory::MemoryQueue;

/// Holding area for pending send jobs
///
/// The lease discipline is the contract's heart: a job returned by
/// [`QueueBackend::lease_next`] is invisible to concurrent leases until the
/// holder settles it with `ack` (terminal removal), `nack` (reschedule) or
/// `release` (put back untouched). Every dispatch path must settle its
/// lease, success or not.
#[async_trait]
pub trait QueueBackend: Send + Sync + std::fmt::Debug {
    /// Add a job to the queue.
    ///
    /// # Errors
    /// Backend-specific failure to persist the job.
    async fn enqueue(&self, job: QueueJob) -> crate::Result<()>;

    /// Lease the next dispatchable job, oldest `process_at` first.
    ///
    /// A job is dispatchable when it is not leased, its `process_at` is due
    /// and it is under its attempt budget. Returns `None` when nothing is
    /// dispatchable.
    ///
    /// # Errors
    /// Backend-specific failure.
    async fn lease_next(&self, now: SystemTime) -> crate::Result<Option<QueueJob>>;

    /// Remove a job permanently (delivered, or dead-lettered).
    ///
    /// Clears the lease.
    ///
    /// # Errors
    /// Backend-specific failure.
    async fn ack(&self, id: &RecordId) -> crate::Result<()>;

    /// Reschedule a failed job and clear its lease.
    ///
    /// # Errors
    /// Backend-specific failure.
    async fn nack(&self, id: &RecordId, attempts: u32, process_at: SystemTime)
    -> crate::Result<()>;

    /// Clear a lease without consuming or rescheduling the job.
    ///
    /// The throttle-denial path: the job stays queued exactly as it was.
    ///
    /// # Errors
    /// Backend-specific failure.
    async fn release(&self, id: &RecordId) -> crate::Result<()>;

    /// Whether a job with this id is currently held.
    ///
    /// # Errors
    /// Backend-specific failure.
    async fn contains(&self, id: &RecordId) -> crate::Result<bool>;

    /// Partition the held jobs by state at `now`.
    ///
    /// # Errors
    /// Backend-specific failure.
    async fn counts(&self, now: SystemTime) -> crate::Result<QueueCounts>;

    /// Number of jobs held.
    ///
    /// # Errors
    /// Backend-specific failure.
    async fn len(&self) -> crate::Result<usize>;

    /// Whether the queue holds no jobs at all.
    ///
    /// # Errors
    /// Backend-specific failure.
    async fn is_empty(&self) -> crate::Result<bool> {
        Ok(self.len().await? == 0)
    }
}
