//! Error kinds shared by the server and the wizard client.
//!
//! Every failure crossing a component boundary is reduced to one of a few
//! kinds so the caller can decide between "fix the input", "ask the
//! operator" and "try again" without parsing messages.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Distinguishable failure categories surfaced to the end user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or incomplete input (config, media type, parameters).
    Validation,
    /// Missing or rejected external API credentials.
    Credentials,
    /// The external service failed or returned something unusable.
    ExternalService,
    /// No answer from the external service within the step's bound.
    Timeout,
    /// The external service processed the input but rejected its content
    /// (for example no face detected in the portrait).
    InputQuality,
    /// A local failure of the studio itself, such as the media directory
    /// being unwritable.
    Internal,
}

impl ErrorKind {
    /// Returns the wire label for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Credentials => "credentials",
            Self::ExternalService => "external_service",
            Self::Timeout => "timeout",
            Self::InputQuality => "input_quality",
            Self::Internal => "internal",
        }
    }

    /// Whether retrying the same request unchanged can succeed.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::ExternalService | Self::Timeout)
    }

    /// Short human-readable guidance shown next to the error message.
    pub fn guidance(self) -> &'static str {
        match self {
            Self::Validation => "Please correct the highlighted input and try again.",
            Self::Credentials => {
                "The service is not configured correctly. Please contact the operator."
            }
            Self::ExternalService => "The generation service failed. Please try again.",
            Self::Timeout => {
                "The generation service did not answer in time. Generation can take several minutes; please try again."
            }
            Self::InputQuality => {
                "The service could not use this input. Please try a different image or audio file."
            }
            Self::Internal => "The studio hit an internal problem. Please contact the operator.",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A kind-tagged error as seen by clients of the studio.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct StudioError {
    pub kind: ErrorKind,
    pub message: String,
}

impl StudioError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn credentials(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Credentials, message)
    }

    pub fn external(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExternalService, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn input_quality(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InputQuality, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

/// JSON body returned by the server for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub kind: ErrorKind,
    pub message: String,
}

impl From<StudioError> for ErrorBody {
    fn from(err: StudioError) -> Self {
        Self {
            success: false,
            kind: err.kind,
            message: err.message,
        }
    }
}

impl From<ErrorBody> for StudioError {
    fn from(body: ErrorBody) -> Self {
        Self::new(body.kind, body.message)
    }
}
