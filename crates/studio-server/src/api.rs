//! Error responses shared by every handler.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use studio_media::GenerationError;
use studio_types::{ErrorBody, ErrorKind, StudioError};
use studio_voice::VoiceError;
use thiserror::Error;

/// API error type mapping to HTTP status codes.
///
/// Every failure is reported as `{success: false, kind, message}` so the
/// client can tell caller mistakes, operator mistakes and transient
/// problems apart.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Studio(StudioError),
    #[error("{0}")]
    UnsupportedMediaType(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Studio(StudioError::validation(message))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Studio(err) => err.kind,
            ApiError::UnsupportedMediaType(_) | ApiError::NotFound(_) => ErrorKind::Validation,
            ApiError::InternalServerError(_) => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Studio(err) => status_for_kind(err.kind),
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(self) -> String {
        match self {
            ApiError::Studio(err) => err.message,
            ApiError::UnsupportedMediaType(msg)
            | ApiError::NotFound(msg)
            | ApiError::InternalServerError(msg) => msg,
        }
    }
}

/// HTTP status used for each error kind.
pub fn status_for_kind(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Credentials => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::ExternalService => StatusCode::BAD_GATEWAY,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::InputQuality => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), kind = kind.as_str(), error = %self, "request failed");
        }

        let body = ErrorBody {
            success: false,
            kind,
            message: self.message(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::InternalServerError(format!("media storage failed: {}", err))
    }
}

impl From<StudioError> for ApiError {
    fn from(err: StudioError) -> Self {
        ApiError::Studio(err)
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::UnsupportedMediaType(msg) => ApiError::UnsupportedMediaType(msg),
            other => ApiError::Studio(other.into()),
        }
    }
}

impl From<VoiceError> for ApiError {
    fn from(err: VoiceError) -> Self {
        ApiError::Studio(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                ApiError::UnsupportedMediaType(
                    "unsupported media type: expected application/json".to_string(),
                )
            }
            other => ApiError::bad_request(other.body_text()),
        }
    }
}
