//! Token bucket rate limiter for a single key.

use parking_lot::Mutex;
use std::time::Instant;

/// A token bucket that admits requests at a configured requests-per-minute
/// limit.
///
/// The bucket holds up to `burst` tokens (burst equals the configured rpm,
/// so a full minute's allowance may be consumed instantly) and refills
/// continuously at `rpm / 60` tokens per second. Each admitted request
/// consumes exactly one token; the availability check and the decrement are
/// a single operation under the bucket's own mutex, so concurrent checks on
/// the same key serialize while checks on different keys never contend.
pub struct RateLimiter {
    state: Mutex<BucketState>,
}

/// Mutable bucket state. Limit, rate, and burst stay mutually consistent:
/// rate = limit_rpm / 60, burst = limit_rpm.
struct BucketState {
    /// Configured limit in requests per minute
    limit_rpm: i64,
    /// Refill rate in tokens per second
    rate: f64,
    /// Maximum token count
    burst: f64,
    /// Currently available tokens (fractional during refill)
    tokens: f64,
    /// Last time the token count was advanced
    last_refill: Instant,
}

impl BucketState {
    /// Accrue tokens for the time elapsed since the last refill, capped at
    /// the burst capacity.
    fn advance(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * self.rate).min(self.burst);
        self.last_refill = now;
    }
}

impl RateLimiter {
    /// Create a new limiter for the given requests-per-minute limit.
    ///
    /// The bucket starts full: a freshly created limiter admits a full
    /// minute's worth of requests immediately.
    pub fn new(limit_rpm: i64) -> Self {
        Self {
            state: Mutex::new(BucketState {
                limit_rpm,
                rate: limit_rpm as f64 / 60.0,
                burst: limit_rpm as f64,
                tokens: limit_rpm as f64,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Admit one request now, consuming a token if one is available.
    ///
    /// Returns `true` if the request is admitted, `false` if the bucket is
    /// exhausted.
    pub fn allow(&self) -> bool {
        self.allow_at(Instant::now())
    }

    /// Admit one request as of the given instant.
    ///
    /// Exposed within the crate so refill behavior is testable without
    /// sleeping.
    pub(crate) fn allow_at(&self, now: Instant) -> bool {
        let mut state = self.state.lock();
        state.advance(now);
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// The currently configured limit in requests per minute.
    pub fn limit_rpm(&self) -> i64 {
        self.state.lock().limit_rpm
    }

    /// Change the configured limit in place.
    ///
    /// Tokens accrued under the old limit are retained, capped at the new
    /// burst, so callers holding a reference observe the updated limit
    /// without losing in-flight allowance.
    pub fn set_limit(&self, limit_rpm: i64) {
        self.set_limit_at(limit_rpm, Instant::now());
    }

    pub(crate) fn set_limit_at(&self, limit_rpm: i64, now: Instant) {
        let mut state = self.state.lock();
        // Accrue at the old rate before switching over.
        state.advance(now);
        state.limit_rpm = limit_rpm;
        state.rate = limit_rpm as f64 / 60.0;
        state.burst = limit_rpm as f64;
        state.tokens = state.tokens.min(state.burst);
    }

    /// Currently available tokens, rounded down.
    pub fn available(&self) -> u64 {
        let mut state = self.state.lock();
        state.advance(Instant::now());
        state.tokens as u64
    }
}
