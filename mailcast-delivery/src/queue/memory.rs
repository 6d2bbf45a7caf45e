//! In-memory queue backend.

use std::{sync::Arc, time::SystemTime};

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};

use mailcast_store::RecordId;

use crate::{
    queue::QueueBackend,
    types::{QueueCounts, QueueJob},
};

/// Process-local queue backend
///
/// Jobs live in a lock-free concurrent map; the lease set substitutes for
/// a lock, guaranteeing that two overlapping processor polls never dispatch
/// the same job. State is lost on restart by design: the durable delivery
/// records are the ledger, and the recovery sweep rebuilds the queue from
/// them.
#[derive(Debug, Clone, Default)]
pub struct MemoryQueue {
    jobs: Arc<DashMap<RecordId, QueueJob>>,
    leased: Arc<DashSet<RecordId>>,
}

impl MemoryQueue {
    /// Create a new empty queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueueBackend for MemoryQueue {
    async fn enqueue(&self, job: QueueJob) -> crate::Result<()> {
        self.jobs.insert(job.id.clone(), job);
        Ok(())
    }

    async fn lease_next(&self, now: SystemTime) -> crate::Result<Option<QueueJob>> {
        loop {
            let candidate = self
                .jobs
                .iter()
                .filter(|entry| {
                    let job = entry.value();
                    !self.leased.contains(&job.id)
                        && job.process_at <= now
                        && job.attempts < job.max_attempts
                })
                .min_by(|a, b| {
                    a.value()
                        .process_at
                        .cmp(&b.value().process_at)
                        .then_with(|| a.key().cmp(b.key()))
                })
                .map(|entry| entry.key().clone());

            let Some(id) = candidate else {
                return Ok(None);
            };

            // insert() returning false means a concurrent poll won the race
            // for this job; pick again.
            if !self.leased.insert(id.clone()) {
                continue;
            }

            match self.jobs.get(&id) {
                Some(entry) => return Ok(Some(entry.value().clone())),
                None => {
                    // Acked between selection and lease
                    self.leased.remove(&id);
                }
            }
        }
    }

    async fn ack(&self, id: &RecordId) -> crate::Result<()> {
        self.jobs.remove(id);
        self.leased.remove(id);
        Ok(())
    }

    async fn nack(
        &self,
        id: &RecordId,
        attempts: u32,
        process_at: SystemTime,
    ) -> crate::Result<()> {
        if let Some(mut entry) = self.jobs.get_mut(id) {
            let job = entry.value_mut();
            job.attempts = attempts;
            job.process_at = process_at;
        }
        self.leased.remove(id);
        Ok(())
    }

    async fn release(&self, id: &RecordId) -> crate::Result<()> {
        self.leased.remove(id);
        Ok(())
    }

    async fn contains(&self, id: &RecordId) -> crate::Result<bool> {
        Ok(self.jobs.contains_key(id))
    }

    async fn counts(&self, now: SystemTime) -> crate::Result<QueueCounts> {
        let mut counts = QueueCounts::default();

        for entry in self.jobs.iter() {
            let job = entry.value();
            counts.total += 1;

            if self.leased.contains(&job.id) {
                counts.processing += 1;
            } else if job.attempts >= job.max_attempts {
                counts.failed += 1;
            } else if job.process_at > now {
                counts.delayed += 1;
            } else {
                counts.ready += 1;
            }
        }

        Ok(counts)
    }

    async fn len(&self) -> crate::Result<usize> {
        Ok(self.jobs.len())
    }
}
