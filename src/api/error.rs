use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::core::TabulaError;

use super::types::ErrorResponse;

/// HTTP status mapping for core errors. Failures are one-shot: the body is
/// the single surfacing of the error, nothing is retried server-side.
pub struct ApiError(pub TabulaError);

impl From<TabulaError> for ApiError {
    fn from(err: TabulaError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            TabulaError::InvalidFilter => (StatusCode::BAD_REQUEST, "INVALID_FILTER"),
            TabulaError::FrameError(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            TabulaError::NoTableSelected => (StatusCode::CONFLICT, "NO_TABLE_SELECTED"),
            TabulaError::SchemaNotFound(_) => (StatusCode::NOT_FOUND, "SCHEMA_NOT_FOUND"),
            TabulaError::TableNotFound(_) => (StatusCode::NOT_FOUND, "TABLE_NOT_FOUND"),
            TabulaError::StoreReadFailure(_) => (StatusCode::BAD_GATEWAY, "STORE_READ_FAILURE"),
            TabulaError::StoreWriteFailure(_) => (StatusCode::BAD_GATEWAY, "STORE_WRITE_FAILURE"),
            TabulaError::ConfigParsingError(_)
            | TabulaError::IoError(_)
            | TabulaError::ArrowError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: self.0.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
