//! HTTP handlers. Each one adapts a request to [`App`] and its result to JSON.

use crate::api::error::ApiError;
use crate::api::types::{HealthResponse, ImageResponse};
use crate::app::App;
use crate::models::GenerationRequest;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{Method, Uri};
use axum::Json;
use std::sync::Arc;

/// `POST /api/generate-image`
pub(crate) async fn generate_image(
    State(app): State<Arc<App>>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Json<ImageResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!("Invalid request body: {}", rejection.body_text());
        ApiError::bad_request("Invalid request body")
    })?;

    let image_url = app.generate(request).await?;
    Ok(Json(ImageResponse { image_url }))
}

/// `GET /api/cache?word=..&partOfSpeech=..&definition=..`
pub(crate) async fn lookup_cache(
    State(app): State<Arc<App>>,
    query: Result<Query<GenerationRequest>, QueryRejection>,
) -> Result<Json<ImageResponse>, ApiError> {
    let Query(request) = query.map_err(|rejection| {
        tracing::warn!("Invalid cache query: {}", rejection.body_text());
        ApiError::bad_request("Invalid query parameters")
    })?;

    let image_url = app.lookup(request).await?;
    Ok(Json(ImageResponse { image_url }))
}

/// `GET /api/health`
pub(crate) async fn health() -> Json<HealthResponse> {
    tracing::debug!("Health check request received");
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

pub(crate) async fn route_not_found(uri: Uri) -> ApiError {
    tracing::warn!("404 Not Found: {}", uri.path());
    ApiError::route_not_found()
}

pub(crate) async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    tracing::warn!("405 Method Not Allowed: {} {}", method, uri.path());
    ApiError::method_not_allowed()
}
