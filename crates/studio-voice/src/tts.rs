use crate::config::ElevenLabsConfig;
use crate::error::VoiceError;
use crate::voices::{default_voice, find_voice, shape_text, ContentType};
use bytes::Bytes;
use serde_json::json;
use studio_types::AudioMediaType;
use tracing::{info, warn};

/// Maximum text length for one synthesis, in characters.
pub const MAX_TTS_INPUT_CHARS: usize = 2000;

/// A text-to-speech request.
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub text: String,
    /// Catalog voice name; `None` selects the configured default.
    pub voice: Option<String>,
    pub content_type: ContentType,
    /// Apply emphasis markers and sentence pauses before synthesis.
    pub shape: bool,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: None,
            content_type: ContentType::default(),
            shape: true,
        }
    }
}

/// Synthesized audio.
#[derive(Debug, Clone)]
pub struct SynthesizedSpeech {
    pub audio: Bytes,
    pub media_type: AudioMediaType,
    pub voice_name: String,
    pub voice_id: String,
}

/// Service for generating speech from text through ElevenLabs.
#[derive(Debug, Clone)]
pub struct TtsService {
    config: ElevenLabsConfig,
    client: reqwest::Client,
}

impl TtsService {
    pub fn new(config: ElevenLabsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "could not build the ElevenLabs HTTP client, falling back to defaults");
                reqwest::Client::new()
            });
        Self { config, client }
    }

    pub fn is_configured(&self) -> bool {
        !self.config.api_key.trim().is_empty()
    }

    pub fn agent_id(&self) -> &str {
        &self.config.agent_id
    }

    /// Resolves the voice id and display name for a request.
    fn resolve_voice(&self, voice: Option<&str>) -> Result<(String, String), VoiceError> {
        match voice.map(str::trim).filter(|v| !v.is_empty()) {
            Some(name) => find_voice(name)
                .map(|v| (v.voice_id.to_string(), v.name.to_string()))
                .ok_or_else(|| VoiceError::ProfileNotFound(name.to_string())),
            None if !self.config.voice_id.is_empty() => {
                Ok((self.config.voice_id.clone(), "Custom".to_string()))
            }
            None => {
                let v = default_voice();
                Ok((v.voice_id.to_string(), v.name.to_string()))
            }
        }
    }

    /// Synthesizes speech from the given text.
    ///
    /// Returns the encoded audio (MP3 with the default output format).
    pub async fn synthesize(&self, request: &SpeechRequest) -> Result<SynthesizedSpeech, VoiceError> {
        let text = request.text.trim();
        if text.is_empty() {
            return Err(VoiceError::Validation("text must not be empty".to_string()));
        }
        let chars = text.chars().count();
        if chars > MAX_TTS_INPUT_CHARS {
            return Err(VoiceError::Validation(format!(
                "text exceeds maximum length: {} characters (limit: {})",
                chars, MAX_TTS_INPUT_CHARS
            )));
        }

        let (voice_id, voice_name) = self.resolve_voice(request.voice.as_deref())?;

        if !self.is_configured() {
            return Err(VoiceError::MissingCredentials);
        }

        let spoken = if request.shape {
            shape_text(text, request.content_type)
        } else {
            text.to_string()
        };

        let url = format!(
            "{}/text-to-speech/{}",
            self.config.base_url.trim_end_matches('/'),
            voice_id
        );

        let response = self
            .client
            .post(url)
            .timeout(self.config.timeout())
            .query(&[("output_format", self.config.output_format.as_str())])
            .header("xi-api-key", &self.config.api_key)
            .json(&json!({
                "text": spoken,
                "model_id": self.config.model_id,
                "voice_settings": {
                    "stability": 0.6,
                    "similarity_boost": 0.8,
                    "style": 0.5,
                    "use_speaker_boost": true
                }
            }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    VoiceError::Timeout(self.config.timeout_secs)
                } else {
                    VoiceError::Tts(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(VoiceError::RejectedCredentials(status.as_u16()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "speech synthesis failed");
            return Err(VoiceError::Tts(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body.chars().take(512).collect::<String>()
            )));
        }

        let media_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|ct| AudioMediaType::parse_declared(ct).ok())
            .unwrap_or(AudioMediaType::Mpeg);

        let audio = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                VoiceError::Timeout(self.config.timeout_secs)
            } else {
                VoiceError::Tts(format!("failed to read audio: {}", e))
            }
        })?;

        if audio.is_empty() {
            return Err(VoiceError::Tts("service returned no audio".to_string()));
        }

        info!(
            voice = %voice_name,
            text_chars = chars,
            audio_bytes = audio.len(),
            content_type = ?request.content_type,
            "speech synthesized"
        );

        Ok(SynthesizedSpeech {
            audio,
            media_type,
            voice_name,
            voice_id,
        })
    }
}
