#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the CrowdWatch dashboard.
//!
//! Holds the location registry in memory (seeded at startup, never
//! persisted) and exposes the dashboard, statistics, real-time and chat
//! actions as JSON endpoints. LLM calls are made without holding the
//! registry lock.

pub mod actions;
mod handlers;
pub mod interactive;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use crowdwatch_ai::providers::{LlmProvider, create_provider_from_env};
use crowdwatch_location::LocationRegistry;

/// Shared application state.
pub struct AppState {
    /// LLM provider used by every action.
    pub provider: Arc<dyn LlmProvider>,
    /// Locations and the current selection.
    pub locations: RwLock<LocationRegistry>,
}

impl AppState {
    /// State with the seed locations.
    #[must_use]
    pub fn seeded(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            locations: RwLock::new(LocationRegistry::seeded()),
        }
    }
}

pub(crate) fn read_registry(lock: &RwLock<LocationRegistry>) -> RwLockReadGuard<'_, LocationRegistry> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_registry(
    lock: &RwLock<LocationRegistry>,
) -> RwLockWriteGuard<'_, LocationRegistry> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/locations", web::get().to(handlers::list_locations))
            .route("/locations", web::post().to(handlers::add_location))
            .route(
                "/locations/{id}/select",
                web::put().to(handlers::select_location),
            )
            .route(
                "/locations/{id}/prediction",
                web::post().to(handlers::predict_location),
            )
            .route("/predictions", web::post().to(handlers::predict))
            .route("/statistics", web::get().to(handlers::statistics))
            .route("/realtime/analyze", web::post().to(handlers::analyze_frame))
            .route("/chat", web::post().to(handlers::chat)),
    );
}

/// Starts the CrowdWatch API server.
///
/// Loads `.env` if present, builds the LLM provider from the environment,
/// seeds the registry and serves on `BIND_ADDR:PORT` (default
/// `127.0.0.1:8080`). The caller initializes logging and provides the
/// runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if no LLM provider can be
/// configured, or the HTTP server fails to bind or encounters a runtime
/// error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    if let Ok(path) = dotenvy::dotenv() {
        log::debug!("Loaded environment from {}", path.display());
    }

    let provider = create_provider_from_env()
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    let state = web::Data::new(AppState::seeded(Arc::from(provider)));
    log::info!(
        "Seeded {} locations",
        read_registry(&state.locations).len()
    );

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
