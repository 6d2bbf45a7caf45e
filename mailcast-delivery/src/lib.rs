//! Delivery queue and batch processor for outbound campaign mail
//!
//! This crate provides functionality to:
//! - Admit one job per (campaign, subscriber) pair, idempotently
//! - Bound the outbound send rate per recipient domain
//! - Retry transient failures with exponential backoff, dead-lettering
//!   once the attempt budget is exhausted
//! - Drain the queue under a wall-clock budget suited to cron invocations

mod error;
mod policy;
mod processor;
pub mod queue;
mod runner;
mod throttle;
mod transport;
mod types;

// Re-export store types callers need at this boundary
pub use mailcast_store::{
    Campaign, CampaignDirectory, CampaignSnapshot, CampaignStatus, DeliveryRecord, DeliveryState,
    MemoryStore, RecordId, RecordStore, Subscriber, SubscriberStatus,
};

pub use error::{DeliveryError, RenderError, Result, TransportError};
pub use policy::RetryPolicy;
pub use processor::{Processor, ProcessorConfig};
pub use queue::{MemoryQueue, QueueBackend};
pub use runner::{BatchSummary, RunnerConfig};
pub use throttle::{DomainThrottles, ThrottleConfig, ThrottleStats};
pub use transport::{ContentRenderer, MailTransport, SnapshotRenderer};
pub use types::{CompiledEmail, JobKind, OutboundEmail, QueueCounts, QueueJob, QueueStats};
