//! Application state - shared across all handlers.

use std::sync::Arc;

use pagebin_core::ports::{RateLimiter, SiteRepository, UserRepository};
use pagebin_infra::{FixedWindowLimiter, InMemorySiteRepository, InMemoryUserRepository};

/// Shared application state.
///
/// Everything here is constructed exactly once at startup and injected;
/// the rate-limit store in particular has no global fallback.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub sites: Arc<dyn SiteRepository>,
    pub limiter: Arc<dyn RateLimiter>,
}

impl AppState {
    /// Build the application state with in-memory implementations.
    pub fn new() -> Self {
        let users: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
        let sites: Arc<dyn SiteRepository> = Arc::new(InMemorySiteRepository::new());
        let limiter: Arc<dyn RateLimiter> = Arc::new(FixedWindowLimiter::new());

        tracing::info!("Application state initialized (in-memory stores)");

        Self {
            users,
            sites,
            limiter,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
