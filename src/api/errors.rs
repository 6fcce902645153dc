use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::backend::BackendError;
use crate::services::image_compression::CompressionError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    /// Guard outcome rather than a failure: answered with `303 See Other`.
    Redirect(&'static str),
    BadRequest(String),
    NotFound(String),
    UnprocessableEntity(String),
    BadGateway(String),
    ServiceUnavailable(String),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    /// Maps a failed backend call to a retryable message; details stay in the logs.
    pub(crate) fn backend(err: BackendError, message: &str) -> Self {
        match err {
            BackendError::NotInitialized => Self::ServiceUnavailable(message.to_string()),
            BackendError::Transport { .. }
            | BackendError::Rejected { .. }
            | BackendError::Decode { .. } => Self::BadGateway(message.to_string()),
        }
    }

    pub(crate) fn compression(err: CompressionError) -> Self {
        tracing::warn!(stage = err.stage(), error = %err, "Image compression failed");
        Self::UnprocessableEntity(format!("Image could not be processed ({}): {err}", err.stage()))
    }
}

fn json_error(status: StatusCode, detail: String) -> Response {
    (status, Json(ErrorResponse { status: status.as_u16(), detail })).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(message) => {
                let mut response = json_error(StatusCode::UNAUTHORIZED, message.to_string());
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
            ApiError::Redirect(location) => {
                let mut response =
                    json_error(StatusCode::SEE_OTHER, format!("Redirecting to {location}"));
                response.headers_mut().insert(header::LOCATION, HeaderValue::from_static(location));
                response
            }
            ApiError::BadRequest(message) => json_error(StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => json_error(StatusCode::NOT_FOUND, message),
            ApiError::UnprocessableEntity(message) => {
                json_error(StatusCode::UNPROCESSABLE_ENTITY, message)
            }
            ApiError::BadGateway(message) => json_error(StatusCode::BAD_GATEWAY, message),
            ApiError::ServiceUnavailable(message) => {
                tracing::error!(error = %message, "Service unavailable");
                json_error(StatusCode::SERVICE_UNAVAILABLE, message)
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        }
    }
}
