use std::time::Duration;
use studio_types::{ErrorKind, StudioError};
use thiserror::Error;

/// Maximum number of characters of an error body kept in messages.
const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("{0}")]
    UnsupportedMediaType(String),

    #[error("{service} API key is not configured")]
    MissingCredentials { service: &'static str },

    #[error("{service} is not configured: {detail}")]
    NotConfigured {
        service: &'static str,
        detail: String,
    },

    #[error("{service} rejected the configured credentials (HTTP {status})")]
    RejectedCredentials { service: &'static str, status: u16 },

    #[error("{service} request failed: {message}")]
    ExternalService {
        service: &'static str,
        status: Option<u16>,
        message: String,
    },

    #[error("{service} did not respond within {} seconds", .after.as_secs())]
    Timeout {
        service: &'static str,
        after: Duration,
    },

    #[error("no face detected in the portrait: {0}")]
    NoFaceDetected(String),

    #[error("{service} refused the request content: {reason}")]
    ContentRejected {
        service: &'static str,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GenerationError {
    /// Maps the error onto the user-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::UnsupportedMediaType(_) => ErrorKind::Validation,
            Self::MissingCredentials { .. }
            | Self::NotConfigured { .. }
            | Self::RejectedCredentials { .. } => ErrorKind::Credentials,
            Self::ExternalService { .. } | Self::Io(_) => ErrorKind::ExternalService,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::NoFaceDetected(_) | Self::ContentRejected { .. } => ErrorKind::InputQuality,
        }
    }

    /// Converts a transport-level failure from `reqwest`.
    pub(crate) fn from_reqwest(
        service: &'static str,
        timeout: Duration,
        err: reqwest::Error,
    ) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                service,
                after: timeout,
            }
        } else {
            Self::ExternalService {
                service,
                status: err.status().map(|s| s.as_u16()),
                message: err.to_string(),
            }
        }
    }

    /// Converts a non-2xx response status and its body.
    pub(crate) fn from_status(service: &'static str, status: u16, body: &str) -> Self {
        if status == 401 || status == 403 {
            return Self::RejectedCredentials { service, status };
        }
        Self::ExternalService {
            service,
            status: Some(status),
            message: format!("HTTP {}: {}", status, truncate(body)),
        }
    }

    pub(crate) fn malformed(service: &'static str, detail: impl Into<String>) -> Self {
        Self::ExternalService {
            service,
            status: None,
            message: format!("malformed response: {}", detail.into()),
        }
    }
}

impl From<StudioError> for GenerationError {
    fn from(err: StudioError) -> Self {
        Self::Validation(err.message)
    }
}

impl From<GenerationError> for StudioError {
    fn from(err: GenerationError) -> Self {
        StudioError::new(err.kind(), err.to_string())
    }
}

pub(crate) fn truncate(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_ERROR_BODY_CHARS {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
        format!("{}...", cut)
    }
}
