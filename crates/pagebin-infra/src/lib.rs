//! # Pagebin Infrastructure
//!
//! Concrete implementations of the ports defined in `pagebin-core`:
//! the in-memory fixed-window rate limiter, in-memory repositories, and
//! the JWT/Argon2 auth services.

pub mod auth;
pub mod rate_limit;
pub mod repository;

pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
pub use rate_limit::FixedWindowLimiter;
pub use repository::{InMemorySiteRepository, InMemoryUserRepository};
