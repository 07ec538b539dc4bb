//! API error type and the mapping from request failures to HTTP responses.
//!
//! Every error leaves as a JSON `{"error": ...}` body. Messages are the
//! user-safe text carried by [`ServiceFailure`]; diagnostic detail is logged
//! where the failure originates and never reaches the response.

use crate::api::types::ErrorResponse;
use crate::models::{FailureKind, ServiceFailure};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

pub const ROUTE_NOT_FOUND: &str = "Route not found";
pub const METHOD_NOT_ALLOWED: &str = "Method not allowed";

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: message.into(),
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn route_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, ROUTE_NOT_FOUND)
    }

    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED)
    }
}

pub fn status_for(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::Validation | FailureKind::ContentPolicyRejection => StatusCode::BAD_REQUEST,
        FailureKind::NotFound => StatusCode::NOT_FOUND,
        FailureKind::CacheUnavailable
        | FailureKind::GeneratorFailure
        | FailureKind::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<ServiceFailure> for ApiError {
    fn from(failure: ServiceFailure) -> Self {
        Self::new(status_for(failure.kind), failure.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SAFETY_REJECTION_MESSAGE;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_failure_kinds_map_to_statuses() {
        assert_eq!(status_for(FailureKind::Validation), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(FailureKind::ContentPolicyRejection),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_for(FailureKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(FailureKind::CacheUnavailable),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(FailureKind::GeneratorFailure),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(FailureKind::Configuration),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_content_policy_keeps_fixed_message() {
        let api: ApiError = ServiceFailure::content_policy().into();
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.body.error, SAFETY_REJECTION_MESSAGE);
    }

    #[tokio::test]
    async fn test_into_response_is_json() {
        let response = ApiError::route_not_found().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "Route not found" }));
    }
}
