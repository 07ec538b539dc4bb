//! HTTP surface.
//!
//! Builds the axum router: the JSON API under `/api`, CORS for the configured
//! frontend origins, request tracing, and an optional static frontend
//! directory for everything outside `/api`.

pub mod error;
mod handlers;
pub mod types;

use crate::app::App;
use axum::handler::HandlerWithoutStateExt;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    pub allowed_origins: Vec<String>,
    pub static_dir: Option<PathBuf>,
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

pub fn build_router(app: Arc<App>, options: RouterOptions) -> Router {
    let api = Router::new()
        .route("/generate-image", post(handlers::generate_image))
        .route("/cache", get(handlers::lookup_cache))
        .route("/health", get(handlers::health))
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .fallback(handlers::route_not_found);

    let router = Router::new().nest("/api", api);
    let router = match options.static_dir {
        Some(dir) => {
            tracing::info!("Serving static files from {}", dir.display());
            router.fallback_service(
                ServeDir::new(dir).not_found_service(handlers::route_not_found.into_service()),
            )
        }
        None => router.fallback(handlers::route_not_found),
    };

    router
        .layer(cors_layer(&options.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(app)
}

