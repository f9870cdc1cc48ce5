//! HTTP handlers and route configuration.

mod auth;
mod health;
mod sites;

use std::sync::Arc;

use actix_web::web;

use pagebin_core::ports::{Endpoint, RateLimiter};

use crate::middleware::rate_limit::RateLimit;

/// Configure all application routes. Throttled endpoints are wrapped here,
/// so every policy is bound at registration time.
pub fn configure_routes(cfg: &mut web::ServiceConfig, limiter: Arc<dyn RateLimiter>) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Auth routes
            .service(
                web::scope("/auth")
                    .service(
                        web::resource("/register")
                            .wrap(RateLimit::new(Endpoint::Register, limiter.clone()))
                            .route(web::post().to(auth::register)),
                    )
                    .service(
                        web::resource("/login")
                            .wrap(RateLimit::new(Endpoint::Login, limiter.clone()))
                            .route(web::post().to(auth::login)),
                    ),
            )
            // Site management routes
            .service(
                web::scope("/sites")
                    .service(
                        web::resource("/check-slug")
                            .wrap(RateLimit::new(Endpoint::CheckSlug, limiter.clone()))
                            .route(web::get().to(sites::check_slug)),
                    )
                    .service(
                        web::resource("")
                            .wrap(RateLimit::new(Endpoint::CreateSite, limiter.clone()))
                            .route(web::post().to(sites::create_site)),
                    )
                    .service(
                        web::resource("/{slug}/files")
                            .wrap(RateLimit::new(Endpoint::UploadFile, limiter))
                            .route(web::post().to(sites::upload_file)),
                    )
                    .route("/{slug}/stats", web::get().to(sites::site_stats)),
            ),
    );

    // Published site content, unthrottled.
    cfg.route(
        "/sites/{slug}/{filename}",
        web::get().to(sites::serve_file),
    );
}
