//! Batch runner: drains the queue under a wall-clock budget.
//!
//! The entry point for an external scheduler (cron slot, serverless
//! invocation) with a hard execution ceiling. The loop dispatches one job
//! at a time, pacing successful dispatches so the transport is not
//! saturated, and stops when the budget is spent — whatever is left simply
//! waits for the next invocation.

use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{error, info};

use crate::processor::Processor;

const fn default_budget_secs() -> u64 {
    240 // 4 minutes, leaving headroom inside a 5-minute cron slot
}

const fn default_dispatch_pause_ms() -> u64 {
    100
}

const fn default_idle_backoff_ms() -> u64 {
    1000
}

/// Pacing configuration for a batch invocation
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    /// Wall-clock budget for one invocation (in seconds)
    #[serde(default = "default_budget_secs")]
    pub budget_secs: u64,

    /// Pause between successful dispatches (in milliseconds)
    #[serde(default = "default_dispatch_pause_ms")]
    pub dispatch_pause_ms: u64,

    /// Pause when no work was ready (in milliseconds)
    #[serde(default = "default_idle_backoff_ms")]
    pub idle_backoff_ms: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            budget_secs: default_budget_secs(),
            dispatch_pause_ms: default_dispatch_pause_ms(),
            idle_backoff_ms: default_idle_backoff_ms(),
        }
    }
}

/// Outcome of one batch invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    /// Jobs dispatched (successfully or into the retry path)
    pub processed: usize,
    /// Wall-clock time actually spent
    pub elapsed: Duration,
}

impl Processor {
    /// Process the queue until the wall-clock budget is exhausted.
    ///
    /// Dispatch errors are logged and absorbed — one bad poll must not end
    /// the invocation early. Returns promptly once the queue holds no jobs
    /// at all; jobs that are merely delayed or throttled keep the loop
    /// alive (backing off between polls) in case they come due within the
    /// budget.
    pub async fn run_batch(&self, config: &RunnerConfig) -> BatchSummary {
        let budget = Duration::from_secs(config.budget_secs);
        let dispatch_pause = Duration::from_millis(config.dispatch_pause_ms);
        let idle_backoff = Duration::from_millis(config.idle_backoff_ms);

        let started = Instant::now();
        let mut processed = 0usize;

        info!(budget_secs = config.budget_secs, "Batch run starting");

        while started.elapsed() < budget {
            match self.process_next().await {
                Ok(true) => {
                    processed += 1;
                    tokio::time::sleep(dispatch_pause).await;
                }
                Ok(false) => {
                    match self.queue().is_empty().await {
                        Ok(true) => break,
                        Ok(false) => {}
                        Err(queue_error) => {
                            error!(error = %queue_error, "Queue poll failed during batch run");
                        }
                    }
                    tokio::time::sleep(idle_backoff).await;
                }
                Err(dispatch_error) => {
                    error!(error = %dispatch_error, "Dispatch failed during batch run");
                    tokio::time::sleep(idle_backoff).await;
                }
            }
        }

        let summary = BatchSummary {
            processed,
            elapsed: started.elapsed(),
        };

        info!(
            processed = summary.processed,
            elapsed_ms = summary.elapsed.as_millis(),
            "Batch run finished"
        );

        summary
    }
}
