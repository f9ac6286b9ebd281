//! Token bucket request throttle.
//!
//! Each data source owns one [`RequestThrottle`] built from its
//! [`RateLimit`] and awaits it before every vendor request.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::provider::RateLimit;

/// Token bucket for a single provider.
#[derive(Debug)]
struct TokenBucket {
    /// Current number of available tokens.
    tokens: f64,
    /// Last time the bucket was updated.
    last_update: Instant,
    /// Token refill rate (tokens per second).
    rate: f64,
    /// Maximum bucket capacity.
    capacity: f64,
}

impl TokenBucket {
    fn with_config(requests_per_minute: u32, capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
            rate: requests_per_minute.max(1) as f64 / 60.0,
            capacity,
        }
    }

    /// Refill tokens based on elapsed time.
    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_update = now;
    }

    fn try_acquire(&mut self) -> bool {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn time_until_available(&mut self) -> Duration {
        self.refill();

        if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / self.rate)
        }
    }
}

/// Per-provider request throttle.
pub struct RequestThrottle {
    provider: &'static str,
    bucket: Mutex<TokenBucket>,
}

impl RequestThrottle {
    pub fn new(provider: &'static str, limit: &RateLimit) -> Self {
        Self {
            provider,
            bucket: Mutex::new(TokenBucket::with_config(
                limit.requests_per_minute,
                limit.burst.max(1) as f64,
            )),
        }
    }

    /// Lock the bucket, recovering from poison.
    ///
    /// A poisoned bucket only means slightly wrong pacing.
    fn lock_bucket(&self) -> MutexGuard<'_, TokenBucket> {
        self.bucket.lock().unwrap_or_else(|poisoned| {
            warn!("Throttle mutex for '{}' was poisoned, recovering", self.provider);
            poisoned.into_inner()
        })
    }

    /// Wait until a request slot is available.
    pub async fn acquire(&self) {
        loop {
            let wait_time = {
                let mut bucket = self.lock_bucket();
                if bucket.try_acquire() {
                    return;
                }
                bucket.time_until_available()
            };

            if wait_time > Duration::ZERO {
                debug!("Throttle: waiting {:?} for provider '{}'", wait_time, self.provider);
                tokio::time::sleep(wait_time).await;
            }
        }
    }

    /// Take a slot if one is free right now.
    pub fn try_acquire(&self) -> bool {
        self.lock_bucket().try_acquire()
    }
}
