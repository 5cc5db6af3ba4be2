use std::collections::VecDeque;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

use crate::provider_policy::{BackoffPolicy, ProviderPolicy};

/// In-memory throttling queue that tracks waiting requests and computes retry delays.
#[derive(Clone)]
pub struct ThrottlingQueue {
    limiter: Arc<DirectRateLimiter>,
    pending: Arc<Mutex<VecDeque<PendingRequest>>>,
    retry_backoff: BackoffPolicy,
}

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

#[derive(Debug, Clone, Copy)]
struct PendingRequest {
    retry_count: u32,
}

impl ThrottlingQueue {
    pub fn new(quota_window: Duration, quota_limit: u32, retry_backoff: BackoffPolicy) -> Self {
        let quota = quota_from_window(quota_window, quota_limit);
        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
            pending: Arc::new(Mutex::new(VecDeque::new())),
            retry_backoff,
        }
    }

    pub fn from_policy(policy: &ProviderPolicy) -> Self {
        Self::new(
            policy.quota_window,
            policy.quota_limit,
            policy.retry_backoff.clone(),
        )
    }

    /// Tries to acquire rate budget. When budget is unavailable the request is
    /// queued and the first backoff delay is returned.
    pub fn acquire(&self) -> Result<(), Duration> {
        if self.limiter.check().is_ok() {
            return Ok(());
        }

        self.pending().push_back(PendingRequest { retry_count: 0 });
        Err(self.retry_delay(0).unwrap_or(self.retry_backoff.max_delay))
    }

    /// Retries the oldest queued request.
    ///
    /// Returns `Ok(())` and dequeues it once budget is available. Otherwise
    /// returns the next delay, or `Err(None)` after the request was dropped
    /// for exhausting its retries.
    pub fn retry_pending(&self) -> Result<(), Option<Duration>> {
        let mut pending = self.pending();
        if self.limiter.check().is_ok() {
            let _ = pending.pop_front();
            return Ok(());
        }

        let Some(request) = pending.front_mut() else {
            return Err(None);
        };
        request.retry_count = request.retry_count.saturating_add(1);
        match self.retry_delay(request.retry_count) {
            Some(delay) => Err(Some(delay)),
            None => {
                let _ = pending.pop_front();
                Err(None)
            }
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending().len()
    }

    pub fn retry_delay(&self, retry_count: u32) -> Option<Duration> {
        if retry_count > self.retry_backoff.max_retries {
            return None;
        }

        let scale = self.retry_backoff.multiplier.powf(f64::from(retry_count));
        let seconds = self.retry_backoff.initial_delay.as_secs_f64() * scale;
        let capped_seconds = seconds.min(self.retry_backoff.max_delay.as_secs_f64());
        Some(Duration::from_secs_f64(capped_seconds))
    }

    fn pending(&self) -> MutexGuard<'_, VecDeque<PendingRequest>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn quota_from_window(quota_window: Duration, quota_limit: u32) -> Quota {
    let burst = NonZeroU32::new(quota_limit).unwrap_or(NonZeroU32::MIN);

    let seconds_per_cell = (quota_window.as_secs_f64() / f64::from(burst.get())).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst)
}
