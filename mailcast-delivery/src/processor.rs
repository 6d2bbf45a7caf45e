//! Delivery processor: admission, dispatch, retry and recovery.

use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};

use serde::Deserialize;
use tracing::{debug, info, warn};

use mailcast_common::Domain;
use mailcast_store::{
    CampaignDirectory, CampaignStatus, DeliveryRecord, DeliveryState, RecordId, RecordStore,
    StoreError, Subscriber,
};

use crate::{
    error::DeliveryError,
    policy::RetryPolicy,
    queue::QueueBackend,
    throttle::{DomainThrottles, ThrottleConfig, ThrottleStats},
    transport::{ContentRenderer, MailTransport},
    types::{JobKind, OutboundEmail, QueueJob, QueueStats},
};

/// Tunable knobs for a [`Processor`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessorConfig {
    /// Per-domain throttle ceilings
    #[serde(default)]
    pub throttle: ThrottleConfig,

    /// Retry schedule and attempt budget
    #[serde(default)]
    pub retry: RetryPolicy,
}

/// Orchestrates campaign delivery
///
/// All collaborators are injected, so multiple isolated processors can
/// coexist (one per test, or one per tenant). The processor itself holds
/// only the throttle windows as mutable state; everything durable lives
/// behind the [`RecordStore`].
#[derive(Debug)]
pub struct Processor {
    queue: Arc<dyn QueueBackend>,
    records: Arc<dyn RecordStore>,
    directory: Arc<dyn CampaignDirectory>,
    transport: Arc<dyn MailTransport>,
    renderer: Arc<dyn ContentRenderer>,
    throttles: DomainThrottles,
    policy: RetryPolicy,
}

impl Processor {
    /// Create a processor over the given collaborators
    #[must_use]
    pub fn new(
        queue: Arc<dyn QueueBackend>,
        records: Arc<dyn RecordStore>,
        directory: Arc<dyn CampaignDirectory>,
        transport: Arc<dyn MailTransport>,
        renderer: Arc<dyn ContentRenderer>,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            queue,
            records,
            directory,
            transport,
            renderer,
            throttles: DomainThrottles::new(config.throttle),
            policy: config.retry,
        }
    }

    /// A reference to the queue backend
    #[must_use]
    pub fn queue(&self) -> &Arc<dyn QueueBackend> {
        &self.queue
    }

    /// Admit one delivery job for a (campaign, subscriber) pair.
    ///
    /// Admission is idempotent: if a record for the pair already exists
    /// (from an earlier call, or a concurrent enqueuer) its id is returned
    /// and nothing else happens. Otherwise a `Queued` record is created and
    /// a job is enqueued, delayed past the domain's throttle window if the
    /// domain is already saturated.
    ///
    /// # Errors
    /// Store failures propagate; nothing was admitted in that case.
    pub async fn add_job(
        &self,
        campaign_id: &str,
        subscriber: &Subscriber,
    ) -> crate::Result<RecordId> {
        let record = DeliveryRecord::new(campaign_id, &subscriber.id, &subscriber.email);
        let key = record.idempotency_key.clone();

        if let Some(existing) = self.records.find_by_key(&key).await? {
            debug!(
                campaign = campaign_id,
                subscriber = subscriber.id,
                record = %existing.id,
                "Delivery already admitted, returning existing record"
            );
            return Ok(existing.id);
        }

        let id = match self.records.create(record).await {
            Ok(id) => id,
            // A concurrent enqueuer created the record between our lookup
            // and our insert; theirs is the admission of record.
            Err(StoreError::DuplicateKey(_)) => {
                return self
                    .records
                    .find_by_key(&key)
                    .await?
                    .map(|record| record.id)
                    .ok_or_else(|| {
                        StoreError::Internal(format!(
                            "Record for key {key} vanished after duplicate-key conflict"
                        ))
                        .into()
                    });
            }
            Err(e) => return Err(e.into()),
        };

        let now = SystemTime::now();
        let domain = Domain::from_email(&subscriber.email);
        let delay = self.throttles.admission_delay(&domain, now);

        self.queue
            .enqueue(QueueJob {
                id: id.clone(),
                kind: JobKind::SendEmail,
                campaign_id: campaign_id.to_string(),
                subscriber_id: subscriber.id.clone(),
                email: subscriber.email.clone(),
                attempts: 0,
                max_attempts: self.policy.max_attempts,
                created_at: now,
                process_at: now + delay,
            })
            .await?;

        debug!(
            campaign = campaign_id,
            subscriber = subscriber.id,
            record = %id,
            delay_ms = delay.as_millis(),
            "Admitted delivery job"
        );

        Ok(id)
    }

    /// Queue a campaign for delivery to every eligible subscriber.
    ///
    /// Eligible means `Active` and not on the suppression list. Each
    /// recipient is admitted independently: one recipient's failure is
    /// logged and skipped, never letting it abort the rest. Finishes by
    /// flipping the campaign's status to `Queued`.
    ///
    /// Returns the number of recipients admitted by this call.
    ///
    /// # Errors
    /// `CampaignNotFound` / `MissingSnapshot` if the campaign cannot be
    /// delivered at all; store failures on the campaign-level reads.
    pub async fn queue_campaign(&self, campaign_id: &str) -> crate::Result<usize> {
        let campaign = self
            .directory
            .campaign(campaign_id)
            .await?
            .ok_or_else(|| DeliveryError::CampaignNotFound(campaign_id.to_string()))?;

        if campaign.snapshot.is_none() {
            return Err(DeliveryError::MissingSnapshot(campaign_id.to_string()));
        }

        let subscribers = self.directory.active_subscribers().await?;
        let mut admitted = 0usize;

        for subscriber in &subscribers {
            match self.admit_subscriber(campaign_id, subscriber).await {
                Ok(true) => admitted += 1,
                Ok(false) => {}
                Err(error) => {
                    warn!(
                        campaign = campaign_id,
                        subscriber = subscriber.id,
                        error = %error,
                        "Failed to admit recipient, continuing with the rest"
                    );
                }
            }
        }

        self.directory
            .set_campaign_status(campaign_id, CampaignStatus::Queued)
            .await?;

        info!(
            campaign = campaign_id,
            admitted,
            eligible = subscribers.len(),
            "Campaign queued"
        );

        Ok(admitted)
    }

    /// Admit one subscriber; `Ok(false)` means suppressed.
    async fn admit_subscriber(
        &self,
        campaign_id: &str,
        subscriber: &Subscriber,
    ) -> crate::Result<bool> {
        if self.directory.is_suppressed(&subscriber.email).await? {
            debug!(
                campaign = campaign_id,
                subscriber = subscriber.id,
                "Recipient suppressed, skipping"
            );
            return Ok(false);
        }

        self.add_job(campaign_id, subscriber).await?;
        Ok(true)
    }

    /// Dispatch the next eligible job, if any.
    ///
    /// Returns `Ok(true)` if a job was dispatched (successfully or not) and
    /// `Ok(false)` if no eligible work existed — including the case where
    /// the head-of-queue job's domain is throttled, in which case the job
    /// stays queued untouched and the caller should back off briefly.
    ///
    /// # Errors
    /// Queue backend failures. Store and transport failures during a
    /// dispatch are absorbed into the retry/dead-letter path.
    pub async fn process_next(&self) -> crate::Result<bool> {
        let now = SystemTime::now();

        let Some(job) = self.queue.lease_next(now).await? else {
            return Ok(false);
        };

        let domain = Domain::from_email(&job.email);
        if !self.throttles.can_send(&domain, now) {
            debug!(
                record = %job.id,
                domain = %domain,
                "Domain throttled, leaving job queued"
            );
            self.queue.release(&job.id).await?;
            return Ok(false);
        }

        match self.attempt_delivery(&job, &domain).await {
            Ok(()) => {
                self.queue.ack(&job.id).await?;
                debug!(record = %job.id, domain = %domain, "Delivered");
            }
            Err(error) => {
                self.handle_failure(&job, &error).await?;
            }
        }

        Ok(true)
    }

    /// One end-to-end delivery attempt for a leased job.
    async fn attempt_delivery(&self, job: &QueueJob, domain: &Domain) -> crate::Result<()> {
        let mut record = self.records.read(&job.id).await?;

        let campaign = self
            .directory
            .campaign(&job.campaign_id)
            .await?
            .ok_or_else(|| DeliveryError::CampaignNotFound(job.campaign_id.clone()))?;

        record.mark_sending(SystemTime::now());
        self.records.update(&record).await?;

        let content = self.renderer.render(&campaign, &job.email)?;

        self.transport
            .send(&OutboundEmail {
                to: job.email.clone(),
                campaign_id: job.campaign_id.clone(),
                content,
            })
            .await?;

        record.mark_sent(SystemTime::now());
        self.records.update(&record).await?;

        self.throttles.record_send(domain, SystemTime::now());

        Ok(())
    }

    /// Reschedule a failed job, or dead-letter it at the attempt cap.
    async fn handle_failure(&self, job: &QueueJob, error: &DeliveryError) -> crate::Result<()> {
        let attempts = job.attempts.saturating_add(1);

        if self.policy.should_retry(attempts) {
            let next = self.policy.next_attempt_at(attempts, SystemTime::now());
            self.queue.nack(&job.id, attempts, next).await?;
            debug!(
                record = %job.id,
                attempts,
                backoff_ms = self.policy.backoff(attempts).as_millis(),
                error = %error,
                "Delivery failed, retry scheduled"
            );
            return Ok(());
        }

        // Dead-letter: persist the failure, then drop the job from memory.
        // A store hiccup here must not leave the job leased forever, so the
        // ack happens regardless.
        match self.records.read(&job.id).await {
            Ok(mut record) => {
                record.mark_failed(error.to_string());
                if let Err(persist_error) = self.records.update(&record).await {
                    warn!(
                        record = %job.id,
                        error = %persist_error,
                        "Failed to persist dead-letter state"
                    );
                }
            }
            Err(read_error) => {
                warn!(
                    record = %job.id,
                    error = %read_error,
                    "Failed to load record while dead-lettering"
                );
            }
        }

        self.queue.ack(&job.id).await?;
        warn!(
            record = %job.id,
            attempts,
            error = %error,
            "Retry budget exhausted, delivery dead-lettered"
        );

        Ok(())
    }

    /// Re-admit records orphaned by a crash.
    ///
    /// In-memory jobs die with the process while their records stay
    /// `Queued`/`Sending`. This sweep finds non-terminal records whose last
    /// activity predates `now - staleness` and rebuilds a job for each one
    /// that is not already queued; records that had already used up their
    /// attempt budget are dead-lettered instead. Run it at process start or
    /// periodically.
    ///
    /// Returns the number of jobs re-admitted.
    ///
    /// # Errors
    /// Store or queue backend failures.
    pub async fn recover(&self, staleness: Duration) -> crate::Result<usize> {
        let now = SystemTime::now();
        let stale = self.records.stale_records(now - staleness).await?;
        let mut readmitted = 0usize;

        for mut record in stale {
            if self.queue.contains(&record.id).await? {
                continue;
            }

            if record.attempts >= self.policy.max_attempts {
                record.mark_failed("Retry budget exhausted before recovery");
                self.records.update(&record).await?;
                warn!(record = %record.id, "Stale record had no budget left, dead-lettered");
                continue;
            }

            if record.state == DeliveryState::Sending {
                record.mark_queued();
                self.records.update(&record).await?;
            }

            let domain = Domain::from_email(&record.email);
            let delay = self.throttles.admission_delay(&domain, now);

            self.queue
                .enqueue(QueueJob {
                    id: record.id.clone(),
                    kind: JobKind::SendEmail,
                    campaign_id: record.campaign_id.clone(),
                    subscriber_id: record.subscriber_id.clone(),
                    email: record.email.clone(),
                    attempts: record.attempts,
                    max_attempts: self.policy.max_attempts,
                    created_at: record.created_at,
                    process_at: now + delay,
                })
                .await?;

            info!(record = %record.id, attempts = record.attempts, "Re-admitted stale delivery");
            readmitted += 1;
        }

        Ok(readmitted)
    }

    /// Queue and throttle statistics at this instant.
    ///
    /// # Errors
    /// Queue backend failures.
    pub async fn stats(&self) -> crate::Result<QueueStats> {
        let counts = self.queue.counts(SystemTime::now()).await?;
        Ok(QueueStats {
            total: counts.total,
            ready: counts.ready,
            processing: counts.processing,
            delayed: counts.delayed,
            failed: counts.failed,
            tracked_domains: self.throttles.tracked_domains(),
        })
    }

    /// Current throttle window for a domain, if one exists.
    #[must_use]
    pub fn throttle_stats(&self, domain: &Domain) -> Option<ThrottleStats> {
        self.throttles.stats(domain, SystemTime::now())
    }
}
