use std::time::Duration;

use rand::Rng;

/// Randomized pause inserted between consecutive items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiter {
    min_secs: u64,
    max_secs: u64,
}

impl RateLimiter {
    /// Bounds are whole seconds; callers validate `min_secs <= max_secs` beforehand.
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self { min_secs, max_secs }
    }

    pub fn next_delay(&self) -> Duration {
        delay_for(&mut rand::thread_rng(), self.min_secs, self.max_secs)
    }
}

/// Uniform whole-second delay in `[min_secs, max_secs]`, both ends inclusive.
pub fn delay_for<R: Rng + ?Sized>(rng: &mut R, min_secs: u64, max_secs: u64) -> Duration {
    let (lo, hi) = if min_secs <= max_secs {
        (min_secs, max_secs)
    } else {
        (max_secs, min_secs)
    };
    Duration::from_secs(rng.gen_range(lo..=hi))
}
