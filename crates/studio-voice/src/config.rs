use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

fn default_base_url() -> String {
    "https://api.elevenlabs.io/v1".to_string()
}

fn default_model_id() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_output_format() -> String {
    "mp3_44100_128".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ElevenLabsConfig {
    #[serde(default, skip_serializing)]
    pub api_key: String,
    /// Conversational agent id. Passed through for clients; unused by TTS.
    #[serde(default)]
    pub agent_id: String,
    /// Voice used when a request names none. Empty means the catalog default.
    #[serde(default)]
    pub voice_id: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default = "default_output_format")]
    pub output_format: String,
    /// Request timeout for one synthesis. Default: 30 seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            agent_id: String::new(),
            voice_id: String::new(),
            base_url: default_base_url(),
            model_id: default_model_id(),
            output_format: default_output_format(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl fmt::Debug for ElevenLabsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_empty() {
            "<unset>"
        } else {
            "[REDACTED]"
        };
        f.debug_struct("ElevenLabsConfig")
            .field("api_key", &api_key)
            .field("agent_id", &self.agent_id)
            .field("voice_id", &self.voice_id)
            .field("base_url", &self.base_url)
            .field("model_id", &self.model_id)
            .field("output_format", &self.output_format)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ElevenLabsConfig {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
