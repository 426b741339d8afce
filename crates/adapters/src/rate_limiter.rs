//! Per-host token-bucket politeness, shared across every job so two
//! concurrent crawls of the same host still see one global budget.
//!
//! The limiter is injected as a capability (`Arc<dyn RateLimiter>`)
//! rather than called as a free function, so tests can substitute a
//! no-op and the scraper never needs to know which backend is behind it.

use async_trait::async_trait;
use governor::clock::{Clock as GovernorClock, DefaultClock};
use governor::{Quota, RateLimiter as GovernorLimiter};
use parking_lot::Mutex;
use quaero_core::CancelToken;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, ScrapeError};

/// Token-bucket parameters for one host.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Sustained requests per second.
    pub refill_per_sec: f64,
    /// Burst capacity — tokens a host can spend in a row before it has
    /// to wait for refill.
    pub burst: u32,
    /// Upper bound, in milliseconds, of random jitter added atop the
    /// computed wait — smooths out thundering-herd refill ticks across
    /// many hosts waking at the same instant.
    pub random_delay_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            refill_per_sec: 1.0,
            burst: 2,
            random_delay_ms: 250,
        }
    }
}

impl From<quaero_core::RateLimitConfig> for RateLimitConfig {
    fn from(c: quaero_core::RateLimitConfig) -> Self {
        Self {
            refill_per_sec: c.refill_per_sec,
            burst: c.burst,
            random_delay_ms: c.random_delay_ms,
        }
    }
}

/// A capability the scraper acquires a token from before every HTTP
/// round-trip — including retries. `acquire` blocks until a token is
/// available or `cancel` fires.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn acquire(&self, host: &str, cancel: &CancelToken) -> Result<()>;
}

type HostLimiter = GovernorLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    DefaultClock,
    governor::middleware::NoOpMiddleware<<DefaultClock as GovernorClock>::Instant>,
>;

const MIN_QUOTA_PER_SEC: u32 = 1;

fn nonzero(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n.max(1)).unwrap_or(NonZeroU32::MIN)
}

/// Per-host token bucket backed by `governor`. One limiter instance is
/// shared across every crawl job — politeness is global, not per-job.
pub struct TokenBucketRateLimiter {
    config: RateLimitConfig,
    buckets: Mutex<HashMap<String, Arc<HostLimiter>>>,
    clock: DefaultClock,
}

impl TokenBucketRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Mutex::new(HashMap::new()),
            clock: DefaultClock::default(),
        }
    }

    fn bucket_for(&self, host: &str) -> Arc<HostLimiter> {
        let mut buckets = self.buckets.lock();
        if let Some(existing) = buckets.get(host) {
            return Arc::clone(existing);
        }
        let per_sec = nonzero(self.config.refill_per_sec.max(0.0).round() as u32);
        let quota = Quota::per_second(per_sec.max(nonzero(MIN_QUOTA_PER_SEC)))
            .allow_burst(nonzero(self.config.burst));
        let limiter = Arc::new(GovernorLimiter::direct(quota));
        buckets.insert(host.to_string(), Arc::clone(&limiter));
        limiter
    }

    /// Pseudo-random jitter in `[0, random_delay_ms]`, derived from the
    /// current fine-grained clock reading rather than a dedicated RNG —
    /// politeness jitter only needs to avoid lockstep wakeups, not
    /// cryptographic unpredictability.
    fn jitter(&self) -> Duration {
        if self.config.random_delay_ms == 0 {
            return Duration::ZERO;
        }
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        Duration::from_millis(u64::from(nanos) % self.config.random_delay_ms)
    }
}

#[async_trait]
impl RateLimiter for TokenBucketRateLimiter {
    async fn acquire(&self, host: &str, cancel: &CancelToken) -> Result<()> {
        let bucket = self.bucket_for(host);
        loop {
            match bucket.check() {
                Ok(()) => return Ok(()),
                Err(not_until) => {
                    let wait = not_until.wait_time_from(self.clock.now()) + self.jitter();
                    tokio::select! {
                        _ = tokio::time::sleep(wait) => continue,
                        _ = cancel.cancelled() => {
                            return Err(ScrapeError::RateLimitCancelled(host.to_string()));
                        }
                    }
                }
            }
        }
    }
}

/// No-op limiter for tests that don't care about politeness.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRateLimiter;

#[async_trait]
impl RateLimiter for NoopRateLimiter {
    async fn acquire(&self, _host: &str, _cancel: &CancelToken) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "rate_limiter_tests.rs"]
mod tests;
