//! Token-bucket pacing for outbound provider calls.

use std::num::NonZeroU32;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Waits for a permit before each query or record.
pub struct Pacer {
    limiter: Option<DirectLimiter>,
}

impl Pacer {
    /// At most `requests_per_second` permits per second, one at a time; `0`
    /// disables pacing.
    pub fn per_second(requests_per_second: u32) -> Self {
        Self {
            limiter: NonZeroU32::new(requests_per_second).map(|rps| {
                RateLimiter::direct(Quota::per_second(rps).allow_burst(NonZeroU32::MIN))
            }),
        }
    }

    pub fn unlimited() -> Self {
        Self { limiter: None }
    }

    pub fn is_limited(&self) -> bool {
        self.limiter.is_some()
    }

    /// Wait until the next permit is available.
    pub async fn wait(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}
