//! # Pagebin Shared
//!
//! Types shared between the API server and clients: request/response DTOs
//! and the standardized response envelopes.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse, RateLimitedResponse};
