//! # Pagebin API Server
//!
//! The main entry point for the Actix-web HTTP server.

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

use pagebin_core::ports::{PasswordService, RateLimiter, TokenService};
use pagebin_infra::{Argon2PasswordService, JwtTokenService};

mod background;
mod config;
mod handlers;
mod middleware;
mod state;

use background::{Scheduler, SchedulerConfig};
use config::AppConfig;
use state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing();

    // Load configuration
    let config = AppConfig::from_env();

    tracing::info!(
        "Starting pagebin API server on {}:{}",
        config.host,
        config.port
    );

    // Build application state
    let state = AppState::new();

    let token_service: Arc<dyn TokenService> = Arc::new(JwtTokenService::from_env());
    let password_service: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());

    // Rate-limit reaper: periodic eviction of expired counter windows,
    // hosted on the scheduler so shutdown has an explicit handle.
    let mut scheduler = Scheduler::new(SchedulerConfig::from_env())
        .await
        .map_err(std::io::Error::other)?;

    let sweep_limiter = state.limiter.clone();
    scheduler
        .add_interval(config.reaper_interval, move || {
            let limiter = sweep_limiter.clone();
            async move {
                match limiter.sweep_expired().await {
                    Ok(removed) if removed > 0 => {
                        tracing::debug!(removed, "evicted expired rate limit windows");
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "rate limit sweep failed"),
                }
            }
        })
        .await
        .map_err(std::io::Error::other)?;

    scheduler.start().await.map_err(std::io::Error::other)?;

    // Start HTTP server
    let limiter = state.limiter.clone();
    HttpServer::new(move || {
        let limiter = limiter.clone();
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(token_service.clone()))
            .app_data(web::Data::new(password_service.clone()))
            .configure(|cfg| handlers::configure_routes(cfg, limiter))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    scheduler.shutdown().await.map_err(std::io::Error::other)?;
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,api_server=debug,pagebin_infra=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}
