//! API error handling

use axum::{
    extract::multipart::MultipartError,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use domain_cid::CidError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message, details) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                errors.join("; "),
                Some(errors),
            ),
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg, None)
            }
            ApiError::Internal(msg) => {
                error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg, None)
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<CidError> for ApiError {
    fn from(err: CidError) -> Self {
        match err {
            CidError::Validation(errors) => ApiError::Validation(errors),
            CidError::HashMismatch { .. } => ApiError::BadRequest(err.to_string()),
            CidError::NotFound(_) => ApiError::NotFound("CID not found".to_string()),
            CidError::DuplicateDocument(_)
            | CidError::DuplicateResponse { .. }
            | CidError::InvalidStatusTransition { .. } => ApiError::Conflict(err.to_string()),
            CidError::Storage(ref port) if port.is_not_found() => ApiError::NotFound(err.to_string()),
            CidError::Storage(ref port) if port.is_transient() => {
                ApiError::ServiceUnavailable(err.to_string())
            }
            CidError::UnknownInsurer { .. }
            | CidError::DocumentNotFound(_)
            | CidError::ClaimIdCollision(_)
            | CidError::Storage(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(vec![rejection.body_text()])
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{ContentHash, PortError};

    #[test]
    fn test_cid_errors_map_to_status_codes() {
        let cases = [
            (CidError::validation("person_a.name: must not be blank"), StatusCode::UNPROCESSABLE_ENTITY),
            (
                CidError::HashMismatch {
                    declared: "abc".to_string(),
                    actual: ContentHash::of(b"pdf"),
                },
                StatusCode::BAD_REQUEST,
            ),
            (CidError::not_found("CID-0"), StatusCode::NOT_FOUND),
            (
                CidError::Storage(PortError::ServiceUnavailable {
                    service: "postgres".to_string(),
                }),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (CidError::Storage(PortError::internal("boom")), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            let label = error.to_string();
            assert_eq!(ApiError::from(error).into_response().status(), expected, "{label}");
        }
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        let error = ApiError::Validation(vec!["Only PDF files are allowed".to_string()]);
        assert_eq!(error.to_string(), "Validation error: Only PDF files are allowed");
    }
}
