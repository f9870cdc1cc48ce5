//! In-memory fixed-window rate limiter.
//!
//! One counter per (endpoint, client identifier) key. Windows are discrete:
//! the first request for a key opens a window, requests inside it count
//! against the ceiling, and the counter is replaced wholesale once the
//! window has passed. Bursts at window boundaries are expected behavior of
//! this algorithm.
//!
//! Note: Limits are per-process, not distributed across instances, and are
//! lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use pagebin_core::ports::{
    Endpoint, RateLimitDecision, RateLimitError, RateLimitPolicy, RateLimiter,
};

/// One counting window.
#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    reset_at_ms: i64,
}

fn entry_key(endpoint: Endpoint, identifier: &str) -> String {
    format!("{}:{}", endpoint.as_str(), identifier)
}

/// Fixed-window counter store guarded by an async RwLock.
///
/// `check` takes the write lock for the whole read-decide-increment step,
/// which keeps concurrent Actix workers from over-admitting on the same key.
pub struct FixedWindowLimiter {
    store: RwLock<HashMap<String, WindowEntry>>,
}

impl FixedWindowLimiter {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
        }
    }

    async fn check_at(
        &self,
        endpoint: Endpoint,
        identifier: &str,
        policy: RateLimitPolicy,
        now_ms: i64,
    ) -> RateLimitDecision {
        let key = entry_key(endpoint, identifier);
        let mut store = self.store.write().await;

        let entry = store.entry(key).or_insert(WindowEntry {
            count: 0,
            reset_at_ms: 0,
        });

        if entry.reset_at_ms <= now_ms {
            // Fresh key, or a window that has already expired: replace
            // outright, no carryover from the previous window.
            *entry = WindowEntry {
                count: 1,
                reset_at_ms: now_ms + policy.window_ms(),
            };
            return RateLimitDecision {
                allowed: true,
                remaining: policy.max_requests.saturating_sub(1),
                reset_at_ms: entry.reset_at_ms,
            };
        }

        if entry.count >= policy.max_requests {
            // Rejection leaves the counter untouched.
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_at_ms: entry.reset_at_ms,
            };
        }

        entry.count += 1;
        RateLimitDecision {
            allowed: true,
            remaining: policy.max_requests - entry.count,
            reset_at_ms: entry.reset_at_ms,
        }
    }

    async fn sweep_at(&self, now_ms: i64) -> usize {
        let mut store = self.store.write().await;
        let before = store.len();
        store.retain(|_, entry| entry.reset_at_ms > now_ms);
        before - store.len()
    }

    /// Number of live entries. Exposed for tests and debug logging.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

impl Default for FixedWindowLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateLimiter for FixedWindowLimiter {
    async fn check(
        &self,
        endpoint: Endpoint,
        identifier: &str,
        policy: RateLimitPolicy,
    ) -> Result<RateLimitDecision, RateLimitError> {
        let now_ms = Utc::now().timestamp_millis();
        Ok(self.check_at(endpoint, identifier, policy, now_ms).await)
    }

    async fn sweep_expired(&self) -> Result<usize, RateLimitError> {
        let now_ms = Utc::now().timestamp_millis();
        Ok(self.sweep_at(now_ms).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn policy(max_requests: u32, window_ms: u64) -> RateLimitPolicy {
        RateLimitPolicy::new(max_requests, Duration::from_millis(window_ms))
    }

    #[tokio::test]
    async fn test_rejects_after_ceiling() {
        let limiter = FixedWindowLimiter::new();
        let p = policy(3, 1000);

        for _ in 0..3 {
            let d = limiter.check_at(Endpoint::Login, "1.2.3.4", p, 0).await;
            assert!(d.allowed);
        }

        let d = limiter.check_at(Endpoint::Login, "1.2.3.4", p, 500).await;
        assert!(!d.allowed);
        assert_eq!(d.remaining, 0);
    }

    #[tokio::test]
    async fn test_remaining_decreases_by_one() {
        let limiter = FixedWindowLimiter::new();
        let p = policy(5, 60_000);

        for expected in (0..5).rev() {
            let d = limiter.check_at(Endpoint::Login, "1.2.3.4", p, 0).await;
            assert!(d.allowed);
            assert_eq!(d.remaining, expected);
        }
    }

    #[tokio::test]
    async fn test_window_fully_resets_after_expiry() {
        let limiter = FixedWindowLimiter::new();
        let p = policy(2, 1000);

        limiter.check_at(Endpoint::Login, "1.2.3.4", p, 0).await;
        limiter.check_at(Endpoint::Login, "1.2.3.4", p, 100).await;
        let rejected = limiter.check_at(Endpoint::Login, "1.2.3.4", p, 200).await;
        assert!(!rejected.allowed);

        // Past reset_at the key behaves as if absent, despite the rejection.
        let d = limiter.check_at(Endpoint::Login, "1.2.3.4", p, 1001).await;
        assert!(d.allowed);
        assert_eq!(d.remaining, 1);
        assert_eq!(d.reset_at_ms, 2001);
    }

    #[tokio::test]
    async fn test_counters_are_independent_per_identifier() {
        let limiter = FixedWindowLimiter::new();
        let p = policy(1, 60_000);

        let d = limiter.check_at(Endpoint::Login, "1.2.3.4", p, 0).await;
        assert!(d.allowed);
        let d = limiter.check_at(Endpoint::Login, "1.2.3.4", p, 0).await;
        assert!(!d.allowed);

        let d = limiter.check_at(Endpoint::Login, "5.6.7.8", p, 0).await;
        assert!(d.allowed);
    }

    #[tokio::test]
    async fn test_counters_are_independent_per_endpoint() {
        let limiter = FixedWindowLimiter::new();
        let p = policy(1, 60_000);

        let d = limiter.check_at(Endpoint::Login, "1.2.3.4", p, 0).await;
        assert!(d.allowed);
        let d = limiter.check_at(Endpoint::Register, "1.2.3.4", p, 0).await;
        assert!(d.allowed);
    }

    #[tokio::test]
    async fn test_reference_scenario() {
        // 3 per second: admitted at t=0,100,200; rejected at 300; admitted
        // again at 1050 once the window has expired.
        let limiter = FixedWindowLimiter::new();
        let p = policy(3, 1000);

        let expected_remaining = [2, 1, 0];
        for (i, t) in [0, 100, 200].into_iter().enumerate() {
            let d = limiter.check_at(Endpoint::CheckSlug, "1.2.3.4", p, t).await;
            assert!(d.allowed);
            assert_eq!(d.remaining, expected_remaining[i]);
            assert_eq!(d.reset_at_ms, 1000);
        }

        let d = limiter.check_at(Endpoint::CheckSlug, "1.2.3.4", p, 300).await;
        assert!(!d.allowed);
        assert_eq!(d.remaining, 0);
        assert_eq!(d.reset_at_ms, 1000);

        let d = limiter
            .check_at(Endpoint::CheckSlug, "1.2.3.4", p, 1050)
            .await;
        assert!(d.allowed);
        assert_eq!(d.remaining, 2);
        assert_eq!(d.reset_at_ms, 2050);
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired_entries() {
        let limiter = FixedWindowLimiter::new();
        let p = policy(5, 1000);

        limiter.check_at(Endpoint::Login, "old", p, 0).await;
        limiter.check_at(Endpoint::Login, "new", p, 5000).await;

        let removed = limiter.sweep_at(5000).await;
        assert_eq!(removed, 1);
        assert_eq!(limiter.len().await, 1);
    }

    #[tokio::test]
    async fn test_sweep_is_idempotent() {
        let limiter = FixedWindowLimiter::new();
        let p = policy(5, 1000);

        limiter.check_at(Endpoint::Login, "a", p, 0).await;
        limiter.check_at(Endpoint::Register, "b", p, 0).await;

        assert_eq!(limiter.sweep_at(2000).await, 2);
        assert_eq!(limiter.sweep_at(2000).await, 0);
        assert!(limiter.is_empty().await);
    }

    #[tokio::test]
    async fn test_check_through_port_uses_wall_clock() {
        let limiter = FixedWindowLimiter::new();
        let p = policy(2, 60_000);

        let d = limiter.check(Endpoint::Login, "1.2.3.4", p).await.unwrap();
        assert!(d.allowed);
        assert_eq!(d.remaining, 1);
        assert!(d.reset_at_ms > Utc::now().timestamp_millis());
    }
}
