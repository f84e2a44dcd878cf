//! Per-key rate limiter registry.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::bucket::RateLimiter;

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// No limit is configured for this key; always admitted
    Unlimited,
    /// A token was available and has been consumed
    Admitted,
    /// The key's bucket is exhausted
    Throttled,
}

impl Decision {
    /// Whether the request should proceed.
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Decision::Throttled)
    }
}

/// Registry of per-key rate limiters.
///
/// Limiters are created lazily on first admission check and live for the
/// registry's lifetime; the key space is expected to be bounded by
/// configuration. The registry is an owned instance shared via `Arc`, so
/// tests and multiple servers get independent state.
///
/// Lookups take only the shared lock in the common case (limiter exists and
/// its limit is unchanged); creation and limit changes take the exclusive
/// lock with a double-checked re-read, so at most one limiter instance ever
/// exists per key.
pub struct AdmissionRegistry {
    limiters: RwLock<HashMap<String, Arc<RateLimiter>>>,
}

impl AdmissionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            limiters: RwLock::new(HashMap::new()),
        }
    }

    /// Check whether a request for `key` is admitted under `limit_rpm`.
    ///
    /// A non-positive `limit_rpm` disables limiting for this call entirely
    /// and never creates registry state for the key.
    pub fn check(&self, key: &str, limit_rpm: i64) -> Decision {
        if limit_rpm <= 0 {
            return Decision::Unlimited;
        }

        let limiter = self.limiter(key, limit_rpm);
        if limiter.allow() {
            Decision::Admitted
        } else {
            debug!(key = %key, limit_rpm = limit_rpm, "Admission denied");
            Decision::Throttled
        }
    }

    /// Boolean form of [`check`](Self::check).
    pub fn allow(&self, key: &str, limit_rpm: i64) -> bool {
        self.check(key, limit_rpm).is_allowed()
    }

    /// Return or create the limiter for `key` at `limit_rpm`.
    ///
    /// The fast path is a shared-lock read that returns the existing
    /// limiter when its configured limit already matches. Otherwise the
    /// exclusive lock is taken and the map re-checked: a concurrent caller
    /// may have created the limiter in between, and a limiter found with a
    /// stale limit is mutated in place rather than replaced, so accrued
    /// tokens and outstanding references stay valid.
    fn limiter(&self, key: &str, limit_rpm: i64) -> Arc<RateLimiter> {
        {
            let limiters = self.limiters.read();
            if let Some(limiter) = limiters.get(key) {
                if limiter.limit_rpm() == limit_rpm {
                    return Arc::clone(limiter);
                }
            }
        }

        let mut limiters = self.limiters.write();

        // Double check under the exclusive lock.
        if let Some(limiter) = limiters.get(key) {
            if limiter.limit_rpm() != limit_rpm {
                debug!(
                    key = %key,
                    limit_rpm = limit_rpm,
                    "Updating rate limit in place"
                );
                limiter.set_limit(limit_rpm);
            }
            return Arc::clone(limiter);
        }

        debug!(key = %key, limit_rpm = limit_rpm, "Creating rate limiter");
        let limiter = Arc::new(RateLimiter::new(limit_rpm));
        limiters.insert(key.to_string(), Arc::clone(&limiter));
        limiter
    }

    /// Number of keys with an active limiter.
    pub fn len(&self) -> usize {
        self.limiters.read().len()
    }

    /// Whether the registry holds no limiters.
    pub fn is_empty(&self) -> bool {
        self.limiters.read().is_empty()
    }

    /// Clear all limiters.
    ///
    /// This is primarily useful for testing.
    pub fn clear(&self) {
        self.limiters.write().clear();
    }
}

impl Default for AdmissionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
