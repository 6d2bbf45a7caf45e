//! Per-domain send-rate throttling using a fixed one-minute window
//!
//! Mailbox providers rate-limit and blacklist senders that burst. Each
//! recipient domain gets its own window with a configurable per-minute
//! ceiling; the window resets lazily on first access after it elapses, so
//! no timers are involved and the arithmetic is a pure function of
//! `(now, reset_at)`.
//!
//! Throttle state is process-local and approximate by design: it is a
//! best-effort limiter, not a distributed guarantee. Running several
//! processor instances concurrently can exceed a ceiling; cross-process
//! enforcement would need the window state moved into the shared store.

use std::time::{Duration, SystemTime};

use dashmap::DashMap;
use mailcast_common::Domain;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Length of the throttle window.
const WINDOW: Duration = Duration::from_secs(60);

/// Configuration for per-domain throttling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Sends per minute for domains without an override
    #[serde(default = "default_per_minute")]
    pub default_per_minute: u32,

    /// Per-domain ceiling overrides (sends per minute)
    #[serde(default = "default_domain_limits")]
    pub domain_limits: ahash::AHashMap<String, u32>,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            default_per_minute: default_per_minute(),
            domain_limits: default_domain_limits(),
        }
    }
}

const fn default_per_minute() -> u32 {
    30
}

/// Consumer webmail providers get provider-specific ceilings; their
/// anti-spam heuristics are considerably more trigger-happy than the
/// average business mail host.
fn default_domain_limits() -> ahash::AHashMap<String, u32> {
    let mut limits = ahash::AHashMap::default();
    limits.insert("gmail.com".to_string(), 40);
    limits.insert("yahoo.com".to_string(), 20);
    limits.insert("outlook.com".to_string(), 25);
    limits.insert("hotmail.com".to_string(), 25);
    limits.insert("aol.com".to_string(), 10);
    limits
}

/// Sliding counter for a single domain
#[derive(Debug, Clone, Copy)]
struct Window {
    /// Successful sends recorded in the current window
    count: u32,
    /// When the window elapses
    reset_at: SystemTime,
}

impl Window {
    fn new(now: SystemTime) -> Self {
        Self {
            count: 0,
            reset_at: now + WINDOW,
        }
    }

    /// Reset the counter if the window boundary has passed.
    fn refresh(&mut self, now: SystemTime) {
        if now >= self.reset_at {
            self.count = 0;
            self.reset_at = now + WINDOW;
        }
    }
}

/// Per-domain throttle manager
#[derive(Debug, Default)]
pub struct DomainThrottles {
    config: ThrottleConfig,
    windows: DashMap<Domain, Window>,
}

impl DomainThrottles {
    /// Create a new throttle manager with the given configuration
    #[must_use]
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            windows: DashMap::new(),
        }
    }

    /// The configured ceiling for a domain
    #[must_use]
    pub fn limit_for(&self, domain: &Domain) -> u32 {
        self.config
            .domain_limits
            .get(domain.as_str())
            .copied()
            .unwrap_or(self.config.default_per_minute)
    }

    /// Whether a send to this domain is currently allowed
    ///
    /// A domain with no window yet is always allowed. An elapsed window is
    /// reset before the check.
    pub fn can_send(&self, domain: &Domain, now: SystemTime) -> bool {
        let Some(mut window) = self.windows.get_mut(domain) else {
            return true;
        };

        window.refresh(now);
        let allowed = window.count < self.limit_for(domain);
        drop(window);

        if !allowed {
            debug!(domain = %domain, "Throttle ceiling reached, stalling sends");
        }

        allowed
    }

    /// Record a successful send to this domain.
    ///
    /// Call only after the transport accepted the message; failed attempts
    /// do not consume throttle budget.
    pub fn record_send(&self, domain: &Domain, now: SystemTime) {
        let mut window = self
            .windows
            .entry(domain.clone())
            .or_insert_with(|| Window::new(now));
        window.refresh(now);
        window.count = window.count.saturating_add(1);
    }

    /// Initial scheduling delay for a job admitted to a saturated domain
    ///
    /// Returns the time remaining until the window resets if the domain is
    /// at or over its ceiling, otherwise zero. Used only at admission, so a
    /// freshly queued job does not immediately stall the queue head.
    #[must_use]
    pub fn admission_delay(&self, domain: &Domain, now: SystemTime) -> Duration {
        let Some(window) = self.windows.get(domain) else {
            return Duration::ZERO;
        };

        if now >= window.reset_at || window.count < self.limit_for(domain) {
            return Duration::ZERO;
        }

        window
            .reset_at
            .duration_since(now)
            .unwrap_or(Duration::ZERO)
    }

    /// Number of domains with a throttle window
    #[must_use]
    pub fn tracked_domains(&self) -> usize {
        self.windows.len()
    }

    /// Current window snapshot for a domain (for observability)
    ///
    /// Reports the logical state at `now`: an elapsed window shows a zero
    /// count even though the lazy reset has not materialised yet.
    #[must_use]
    pub fn stats(&self, domain: &Domain, now: SystemTime) -> Option<ThrottleStats> {
        self.windows.get(domain).map(|window| {
            let elapsed = now >= window.reset_at;
            ThrottleStats {
                count: if elapsed { 0 } else { window.count },
                limit: self.limit_for(domain),
                resets_in: if elapsed {
                    Duration::ZERO
                } else {
                    window
                        .reset_at
                        .duration_since(now)
                        .unwrap_or(Duration::ZERO)
                },
            }
        })
    }
}

/// Point-in-time view of one domain's throttle window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleStats {
    /// Sends recorded in the current window
    pub count: u32,
    /// Configured ceiling
    pub limit: u32,
    /// Time until the window resets
    pub resets_in: Duration,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn throttles_with_limit(domain: &str, limit: u32) -> DomainThrottles {
        let mut config = ThrottleConfig::default();
        config.domain_limits.insert(domain.to_string(), limit);
        DomainThrottles::new(config)
    }

    #[test]
    fn test_untracked_domain_allowed() {
        let throttles = DomainThrottles::new(ThrottleConfig::default());
        let domain = Domain::new("example.com");
        assert!(throttles.can_send(&domain, SystemTime::now()));
        assert_eq!(throttles.tracked_domains(), 0);
    }

    #[test]
    fn test_ceiling_enforced_within_window() {
        let throttles = throttles_with_limit("example.com", 3);
        let domain = Domain::new("example.com");
        let now = SystemTime::now();

        for _ in 0..3 {
            assert!(throttles.can_send(&domain, now));
            throttles.record_send(&domain, now);
        }

        assert!(!throttles.can_send(&domain, now));
        assert_eq!(
            throttles.stats(&domain, now),
            Some(ThrottleStats {
                count: 3,
                limit: 3,
                resets_in: WINDOW,
            })
        );
    }

    #[test]
    fn test_window_resets_lazily() {
        let throttles = throttles_with_limit("example.com", 1);
        let domain = Domain::new("example.com");
        let now = SystemTime::now();

        throttles.record_send(&domain, now);
        assert!(!throttles.can_send(&domain, now));

        // One window later the counter logically starts over
        let later = now + WINDOW + Duration::from_secs(1);
        assert!(throttles.can_send(&domain, later));
        let stats = throttles.stats(&domain, later).unwrap();
        assert_eq!(stats.count, 0);
    }

    #[test]
    fn test_default_limits_apply() {
        let throttles = DomainThrottles::new(ThrottleConfig::default());
        assert_eq!(throttles.limit_for(&Domain::new("gmail.com")), 40);
        assert_eq!(throttles.limit_for(&Domain::new("aol.com")), 10);
        assert_eq!(throttles.limit_for(&Domain::new("example.com")), 30);
    }

    #[test]
    fn test_admission_delay_zero_under_ceiling() {
        let throttles = throttles_with_limit("example.com", 2);
        let domain = Domain::new("example.com");
        let now = SystemTime::now();

        assert_eq!(throttles.admission_delay(&domain, now), Duration::ZERO);

        throttles.record_send(&domain, now);
        assert_eq!(throttles.admission_delay(&domain, now), Duration::ZERO);
    }

    #[test]
    fn test_admission_delay_at_ceiling() {
        let throttles = throttles_with_limit("example.com", 1);
        let domain = Domain::new("example.com");
        let now = SystemTime::now();

        throttles.record_send(&domain, now);

        let delay = throttles.admission_delay(&domain, now + Duration::from_secs(10));
        assert_eq!(delay, Duration::from_secs(50));

        // Elapsed window means no delay
        let delay = throttles.admission_delay(&domain, now + WINDOW);
        assert_eq!(delay, Duration::ZERO);
    }

    #[test]
    fn test_record_send_after_elapsed_window_restarts_count() {
        let throttles = throttles_with_limit("example.com", 5);
        let domain = Domain::new("example.com");
        let now = SystemTime::now();

        throttles.record_send(&domain, now);
        throttles.record_send(&domain, now);

        let later = now + WINDOW + Duration::from_secs(1);
        throttles.record_send(&domain, later);

        let stats = throttles.stats(&domain, later).unwrap();
        assert_eq!(stats.count, 1);
    }

    #[test]
    fn test_domains_isolated() {
        let throttles = throttles_with_limit("slow.example.com", 1);
        let slow = Domain::new("slow.example.com");
        let fast = Domain::new("fast.example.com");
        let now = SystemTime::now();

        throttles.record_send(&slow, now);
        assert!(!throttles.can_send(&slow, now));
        assert!(throttles.can_send(&fast, now));
        assert_eq!(throttles.tracked_domains(), 1);
    }
}
