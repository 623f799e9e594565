use studio_types::{ErrorKind, StudioError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("invalid speech request: {0}")]
    Validation(String),

    #[error("ElevenLabs API key is not configured")]
    MissingCredentials,

    #[error("ElevenLabs rejected the configured credentials (HTTP {0})")]
    RejectedCredentials(u16),

    #[error("TTS error: {0}")]
    Tts(String),

    #[error("TTS request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Voice profile not found: {0}")]
    ProfileNotFound(String),
}

impl VoiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::ProfileNotFound(_) => ErrorKind::Validation,
            Self::MissingCredentials | Self::RejectedCredentials(_) => ErrorKind::Credentials,
            Self::Tts(_) => ErrorKind::ExternalService,
            Self::Timeout(_) => ErrorKind::Timeout,
        }
    }
}

impl From<VoiceError> for StudioError {
    fn from(err: VoiceError) -> Self {
        StudioError::new(err.kind(), err.to_string())
    }
}
