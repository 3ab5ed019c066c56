use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Fixed-rate request throttle.
///
/// Owns a single "earliest next request time" guarded by a mutex, so
/// it is safe to share between concurrent callers: each `acquire`
/// reserves a distinct slot, spaced one minimum interval apart, and
/// sleeps until that slot arrives. The slot advances regardless of
/// whether the request that follows succeeds.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    next_slot: Mutex<Instant>,
}

impl RateLimiter {
    /// Create a limiter allowing at most `rate` requests per second.
    /// A non-positive rate disables throttling.
    pub fn per_second(rate: f64) -> Self {
        let min_interval = if rate > 0.0 {
            Duration::from_secs_f64(1.0 / rate)
        } else {
            Duration::ZERO
        };
        Self {
            min_interval,
            next_slot: Mutex::new(Instant::now()),
        }
    }

    /// Reserve the next request slot and wait until it arrives.
    pub async fn acquire(&self) {
        let at = {
            let mut next = self.next_slot.lock().await;
            let at = (*next).max(Instant::now());
            *next = at + self.min_interval;
            at
        };
        sleep_until(at).await;
    }
}
