pub mod auth_handler;
pub mod consortium_handler;
pub mod extract;
pub mod journal_handler;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::application::services::ServiceError;
use crate::domain::errors::ApiError;
use crate::persistence::DatabaseError;

/// Error body returned by every endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Domain(e) => e.into(),
            ServiceError::InvalidCredentials => {
                ApiError::Unauthorized("invalid credentials".to_string())
            }
            ServiceError::Store(e) => {
                error!("Journal store failure: {}", e);
                ApiError::InternalServerError("journal data could not be read or written".to_string())
            }
            ServiceError::Database(DatabaseError::Duplicate(msg)) => ApiError::Conflict(msg),
            ServiceError::Secret(e) => {
                error!("Password handling failure: {}", e);
                ApiError::InternalServerError("password could not be processed".to_string())
            }
            ServiceError::Database(e) => {
                error!("Database failure: {}", e);
                ApiError::InternalServerError("database error".to_string())
            }
        }
    }
}
