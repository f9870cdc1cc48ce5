//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub email: String,
    pub password: String,
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response containing authentication tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Query for slug availability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckSlugQuery {
    pub slug: String,
}

/// Response to a slug availability check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlugAvailabilityResponse {
    pub slug: String,
    pub available: bool,
}

/// Request to create a new site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSiteRequest {
    pub slug: String,
    pub name: String,
}

/// Response containing a site's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteResponse {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub file_count: usize,
    pub created_at: String,
}

/// Request to upload a file into a site bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadFileRequest {
    pub name: String,
    pub content: String,
}

/// Response after a file upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadFileResponse {
    pub name: String,
    pub size_bytes: usize,
    pub url: String,
}

/// Basic per-site analytics for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteStatsResponse {
    pub slug: String,
    pub hits: u64,
    pub file_count: usize,
}
