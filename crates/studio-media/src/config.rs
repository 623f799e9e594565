use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

fn default_imagen_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_imagen_model() -> String {
    "imagen-3.0-generate-002".to_string()
}

fn default_imagen_timeout_secs() -> u64 {
    30
}

/// Settings for the Imagen image-generation API.
#[derive(Clone, Serialize, Deserialize)]
pub struct ImagenConfig {
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default = "default_imagen_base_url")]
    pub base_url: String,
    #[serde(default = "default_imagen_model")]
    pub model: String,
    /// Request timeout for one generation. Default: 30 seconds.
    #[serde(default = "default_imagen_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ImagenConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_imagen_base_url(),
            model: default_imagen_model(),
            timeout_secs: default_imagen_timeout_secs(),
        }
    }
}

impl fmt::Debug for ImagenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagenConfig")
            .field("api_key", &redacted(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ImagenConfig {
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

/// Where the lip-sync animation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationMode {
    /// Spawn SadTalker's `inference.py` on this host.
    #[default]
    Local,
    /// POST to a hosted SadTalker-compatible endpoint.
    Remote,
}

impl AnimationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

impl std::str::FromStr for AnimationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "remote" | "api" => Ok(Self::Remote),
            other => Err(format!("unknown animation mode: {}", other)),
        }
    }
}

fn default_python() -> PathBuf {
    PathBuf::from("python3")
}

fn default_sadtalker_dir() -> PathBuf {
    PathBuf::from("SadTalker")
}

fn default_checkpoint_dir() -> PathBuf {
    PathBuf::from("SadTalker/checkpoints")
}

fn default_animation_timeout_secs() -> u64 {
    600
}

/// Settings for the SadTalker lip-sync service.
#[derive(Clone, Serialize, Deserialize)]
pub struct AnimationConfig {
    #[serde(default)]
    pub mode: AnimationMode,
    /// Remote endpoint receiving the multipart request (remote mode).
    #[serde(default)]
    pub endpoint: String,
    /// Optional bearer token for the remote endpoint.
    #[serde(default, skip_serializing)]
    pub api_key: String,
    /// SadTalker checkout containing `inference.py` (local mode).
    #[serde(default = "default_sadtalker_dir")]
    pub sadtalker_dir: PathBuf,
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: PathBuf,
    #[serde(default = "default_python")]
    pub python: PathBuf,
    /// Upper bound for one animation. Default: 600 seconds.
    #[serde(default = "default_animation_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            mode: AnimationMode::default(),
            endpoint: String::new(),
            api_key: String::new(),
            sadtalker_dir: default_sadtalker_dir(),
            checkpoint_dir: default_checkpoint_dir(),
            python: default_python(),
            timeout_secs: default_animation_timeout_secs(),
        }
    }
}

impl fmt::Debug for AnimationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationConfig")
            .field("mode", &self.mode)
            .field("endpoint", &self.endpoint)
            .field("api_key", &redacted(&self.api_key))
            .field("sadtalker_dir", &self.sadtalker_dir)
            .field("checkpoint_dir", &self.checkpoint_dir)
            .field("python", &self.python)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AnimationConfig {
    pub fn remote(endpoint: impl Into<String>) -> Self {
        Self {
            mode: AnimationMode::Remote,
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

pub(crate) fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "[REDACTED]"
    }
}
