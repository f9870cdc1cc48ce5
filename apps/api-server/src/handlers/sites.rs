//! Site management and serving handlers.

use actix_web::{HttpResponse, web};

use pagebin_core::domain::{Site, SiteFile, validate_slug};
use pagebin_shared::dto::{
    CheckSlugQuery, CreateSiteRequest, SiteResponse, SiteStatsResponse, SlugAvailabilityResponse,
    UploadFileRequest, UploadFileResponse,
};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/sites/check-slug?slug=my-site
pub async fn check_slug(
    state: web::Data<AppState>,
    query: web::Query<CheckSlugQuery>,
) -> AppResult<HttpResponse> {
    let slug = query.into_inner().slug;

    validate_slug(&slug)?;

    let available = state.sites.find_by_slug(&slug).await?.is_none();

    Ok(HttpResponse::Ok().json(SlugAvailabilityResponse { slug, available }))
}

/// POST /api/sites
pub async fn create_site(
    identity: Identity,
    state: web::Data<AppState>,
    body: web::Json<CreateSiteRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    validate_slug(&req.slug)?;
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Site name is required".to_string()));
    }

    if state.sites.find_by_slug(&req.slug).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "Slug '{}' is already taken",
            req.slug
        )));
    }

    let site = Site::new(req.slug, req.name, identity.user_id);
    let saved = state.sites.save(site).await?;

    tracing::info!(slug = %saved.slug, owner = %identity.email, "site created");

    Ok(HttpResponse::Created().json(SiteResponse {
        id: saved.id.to_string(),
        slug: saved.slug,
        name: saved.name,
        file_count: saved.files.len(),
        created_at: saved.created_at.to_rfc3339(),
    }))
}

/// POST /api/sites/{slug}/files
pub async fn upload_file(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UploadFileRequest>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let req = body.into_inner();

    if req.name.is_empty() || req.name.contains('/') || req.name.contains("..") {
        return Err(AppError::BadRequest("Invalid file name".to_string()));
    }

    let mut site = state
        .sites
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No site with slug '{}'", slug)))?;

    if site.owner_id != identity.user_id {
        return Err(AppError::Forbidden);
    }

    let file = SiteFile::new(req.name.clone(), req.content);
    let size_bytes = file.size_bytes();
    site.put_file(file);
    state.sites.save(site).await?;

    tracing::info!(slug = %slug, file = %req.name, size_bytes, "file uploaded");

    Ok(HttpResponse::Created().json(UploadFileResponse {
        url: format!("/sites/{}/{}", slug, req.name),
        name: req.name,
        size_bytes,
    }))
}

/// GET /sites/{slug}/{filename} - serve published content.
pub async fn serve_file(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (slug, filename) = path.into_inner();

    let site = state
        .sites
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No site with slug '{}'", slug)))?;

    let file = site
        .file(&filename)
        .ok_or_else(|| AppError::NotFound(format!("No file '{}' in site", filename)))?;

    // A lost hit is not worth failing the page load over.
    if let Err(e) = state.sites.record_hit(&slug).await {
        tracing::warn!(slug = %slug, error = %e, "failed to record hit");
    }

    Ok(HttpResponse::Ok()
        .content_type(content_type_for(&filename))
        .body(file.content.clone()))
}

/// GET /api/sites/{slug}/stats - owner-only analytics.
pub async fn site_stats(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();

    let site = state
        .sites
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No site with slug '{}'", slug)))?;

    if site.owner_id != identity.user_id {
        return Err(AppError::Forbidden);
    }

    Ok(HttpResponse::Ok().json(SiteStatsResponse {
        slug: site.slug,
        hits: site.hits,
        file_count: site.files.len(),
    }))
}

fn content_type_for(filename: &str) -> &'static str {
    match filename.rsplit('.').next() {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
