//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use aroma_domain::error::{AromaError, ValidationError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

/// Maps [`AromaError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(AromaError);

impl From<AromaError> for ApiError {
    fn from(err: AromaError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(AromaError::InvalidArgument(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self.0 {
            AromaError::InvalidArgument(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            AromaError::Hardware(err) => {
                tracing::error!(error = %err, "unhandled hardware error");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            AromaError::Dispatch(err) => {
                tracing::error!(error = %err, "unhandled dispatch error");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}
