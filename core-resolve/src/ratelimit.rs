//! Per-provider rate limiting.
//!
//! MusicBrainz allows anonymous clients 1 request/second and the Cover Art
//! Archive shares that contract, so every request to either host passes
//! through the same bucket. Providers without a registered bucket pass
//! through immediately.
//!
//! The bucket map is the only state in the engine that lives across requests
//! and is shared by concurrently in-flight resolutions; all mutation happens
//! under the internal lock, and sleeping always happens outside it.

use crate::error::{ResolveError, Result};
use crate::model::ProviderId;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Token-bucket limiter enforcing external rate contracts, keyed by provider.
#[derive(Debug, Default)]
pub struct RateGovernor {
    buckets: Mutex<HashMap<ProviderId, TokenBucket>>,
}

#[derive(Debug)]
struct TokenBucket {
    capacity: u32,
    tokens: u32,
    refill_interval: Duration,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: u32, refill_interval: Duration) -> Self {
        Self {
            capacity,
            tokens: capacity,
            refill_interval,
            last_refill: Instant::now(),
        }
    }

    /// Credits one token per elapsed refill interval, up to capacity.
    fn refill(&mut self, now: Instant) {
        if self.refill_interval.is_zero() {
            self.tokens = self.capacity;
            return;
        }
        let elapsed = now.saturating_duration_since(self.last_refill);
        let intervals = elapsed.as_nanos() / self.refill_interval.as_nanos();
        if intervals == 0 {
            return;
        }
        let credited = u128::from(self.tokens) + intervals;
        if credited >= u128::from(self.capacity) {
            self.tokens = self.capacity;
            // Full bucket: the refill clock restarts at the next take.
            self.last_refill = now;
        } else {
            self.tokens = credited as u32;
            self.last_refill += self.refill_interval * intervals as u32;
        }
    }

    /// Takes one token, or reports how long until the next one is credited.
    fn take_or_delay(&mut self, now: Instant) -> Option<Duration> {
        self.refill(now);
        if self.tokens > 0 {
            self.tokens -= 1;
            None
        } else {
            let next = self.last_refill + self.refill_interval;
            Some(next.saturating_duration_since(now))
        }
    }
}

impl RateGovernor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_bucket(
        self,
        provider: ProviderId,
        capacity: u32,
        refill_interval: Duration,
    ) -> Self {
        self.register(provider, capacity, refill_interval);
        self
    }

    /// Installs (or replaces) the bucket for a provider. The bucket starts
    /// full.
    pub fn register(&self, provider: ProviderId, capacity: u32, refill_interval: Duration) {
        self.lock()
            .insert(provider, TokenBucket::new(capacity, refill_interval));
    }

    /// Blocks until the provider's bucket has capacity, or until the caller's
    /// cancellation fires.
    pub async fn wait(&self, provider: ProviderId, cancel: &CancellationToken) -> Result<()> {
        loop {
            if cancel.is_cancelled() {
                return Err(ResolveError::Cancelled);
            }

            let delay = match self.lock().get_mut(&provider) {
                Some(bucket) => bucket.take_or_delay(Instant::now()),
                // No rate contract registered for this provider.
                None => None,
            };

            match delay {
                None => return Ok(()),
                Some(delay) => {
                    debug!(provider = %provider, ?delay, "Rate limiting: waiting for refill");
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(ResolveError::Cancelled),
                        _ = sleep(delay) => {}
                    }
                }
            }
        }
    }

    /// Non-blocking variant: takes a token if one is available right now.
    pub fn try_acquire(&self, provider: ProviderId) -> bool {
        match self.lock().get_mut(&provider) {
            Some(bucket) => bucket.take_or_delay(Instant::now()).is_none(),
            None => true,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ProviderId, TokenBucket>> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
