//! Rate limiting port - fixed-window counters keyed by (endpoint, client).

use async_trait::async_trait;
use std::time::Duration;

/// Throttled operations. Each endpoint has its own policy and its own
/// counters; requests against one never affect another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Login,
    Register,
    CheckSlug,
    CreateSite,
    UploadFile,
}

impl Endpoint {
    /// Stable name used in counter keys and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Login => "login",
            Endpoint::Register => "register",
            Endpoint::CheckSlug => "check_slug",
            Endpoint::CreateSite => "create_site",
            Endpoint::UploadFile => "upload_file",
        }
    }

    /// Policy for this endpoint, fixed at compile time. Declaring policies
    /// on the enum means an endpoint without one is unrepresentable.
    pub fn policy(&self) -> RateLimitPolicy {
        match self {
            Endpoint::Login => RateLimitPolicy::new(5, Duration::from_secs(60)),
            Endpoint::Register => RateLimitPolicy::new(3, Duration::from_secs(3600)),
            Endpoint::CheckSlug => RateLimitPolicy::new(10, Duration::from_secs(60)),
            Endpoint::CreateSite => RateLimitPolicy::new(5, Duration::from_secs(3600)),
            Endpoint::UploadFile => RateLimitPolicy::new(10, Duration::from_secs(3600)),
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fixed-window rate limit: at most `max_requests` admitted per `window`.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    pub const fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window.as_millis() as i64
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests left in the current window after this one.
    pub remaining: u32,
    /// Epoch milliseconds at which the current window expires.
    pub reset_at_ms: i64,
}

impl RateLimitDecision {
    /// Whole seconds until the window resets, rounded up. Never negative.
    pub fn retry_after_secs(&self, now_ms: i64) -> i64 {
        ((self.reset_at_ms - now_ms).max(0) + 999) / 1000
    }
}

/// Rate limiter trait - abstraction over rate limiting backends.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Check whether `identifier` may call `endpoint` under `policy`,
    /// counting the request if admitted. The check-and-increment is atomic
    /// per key: concurrent callers cannot over-admit.
    async fn check(
        &self,
        endpoint: Endpoint,
        identifier: &str,
        policy: RateLimitPolicy,
    ) -> Result<RateLimitDecision, RateLimitError>;

    /// Evict windows that have already expired. Returns the number of
    /// entries removed. Pure housekeeping; failures must not propagate
    /// beyond the caller's log line.
    async fn sweep_expired(&self) -> Result<usize, RateLimitError>;
}

/// Rate limit errors.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Backend error: {0}")]
    Backend(String),
}
