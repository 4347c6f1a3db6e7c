//! Error responses
//!
//! This is the only place where error kinds become HTTP status codes.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use revhub_core::{CoreError, ErrorKind};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable code such as `duplicate_id`
    pub error: String,
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    /// Request could not be decoded or failed field checks
    Validation(String),
    Core(CoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Core(err) => match err.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Reference => StatusCode::NOT_FOUND,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Core(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation(message) => ErrorResponse {
                error: "validation_error".to_string(),
                message,
            },
            ApiError::Core(err) if err.kind() == ErrorKind::Internal => {
                error!("Internal error: {:?}", err);
                ErrorResponse {
                    error: err.code().to_string(),
                    message: "internal server error".to_string(),
                }
            }
            ApiError::Core(err) => ErrorResponse {
                error: err.code().to_string(),
                message: err.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}
