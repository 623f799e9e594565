//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;
use studio_media::{AnimationConfig, ImagenConfig};
use studio_voice::ElevenLabsConfig;
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Generated media storage.
    #[serde(default)]
    pub media: MediaConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Per-IP limits on the generation endpoints.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub imagen: ImagenConfig,

    #[serde(default)]
    pub elevenlabs: ElevenLabsConfig,

    #[serde(default)]
    pub animation: AnimationConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory with the built web client, served as a fallback.
    #[serde(default)]
    pub client_dir: Option<PathBuf>,
}

/// Where generated portraits are stored and served from.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    #[serde(default = "default_media_dir")]
    pub dir: PathBuf,

    /// Portraits older than this are deleted. 0 keeps them forever.
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u64,

    /// Seconds between retention sweeps.
    #[serde(default = "default_retention_sweep_secs")]
    pub retention_sweep_secs: u64,
}

impl MediaConfig {
    /// Maximum portrait age, or `None` when retention is disabled.
    pub fn retention(&self) -> Option<Duration> {
        (self.retention_hours > 0).then(|| Duration::from_secs(self.retention_hours * 3600))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "studio_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Fixed-window request limits per client IP, per minute.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RateLimitConfig {
    /// Limit for `POST /avatar/generate` and `POST /avatar/speech`.
    #[serde(default = "default_generate_limit")]
    pub generate_per_minute: u32,

    /// Limit for the video endpoints.
    #[serde(default = "default_video_limit")]
    pub video_per_minute: u32,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    8000
}

fn default_media_dir() -> PathBuf {
    PathBuf::from("media")
}

fn default_retention_hours() -> u64 {
    72
}

fn default_retention_sweep_secs() -> u64 {
    3600
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_generate_limit() -> u32 {
    30
}

fn default_video_limit() -> u32 {
    6
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            client_dir: None,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            dir: default_media_dir(),
            retention_hours: default_retention_hours(),
            retention_sweep_secs: default_retention_sweep_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            generate_per_minute: default_generate_limit(),
            video_per_minute: default_video_limit(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment override had an unusable value.
    #[error("invalid value for {name}: {reason}")]
    InvalidEnv { name: &'static str, reason: String },
}

/// Source of environment overrides; tests substitute a map.
pub trait EnvSource {
    fn get(&self, name: &str) -> Option<String>;
}

/// Reads overrides from the process environment.
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for std::collections::HashMap<&str, &str> {
    fn get(&self, name: &str) -> Option<String> {
        std::collections::HashMap::get(self, name).map(|v| v.to_string())
    }
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `STUDIO_HOST`, `STUDIO_PORT` override `server.host` / `server.port`
/// - `STUDIO_CLIENT_DIR` overrides `server.client_dir`
/// - `STUDIO_MEDIA_DIR` overrides `media.dir`
/// - `STUDIO_MEDIA_RETENTION_HOURS` overrides `media.retention_hours`
/// - `STUDIO_LOG_LEVEL` overrides `logging.level`
/// - `STUDIO_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `GEMINI_API_KEY` overrides `imagen.api_key`
/// - `ELEVENLABS_API_KEY`, `ELEVENLABS_AGENT_ID`, `ELEVENLABS_VOICE_ID`
///   override the matching `elevenlabs` keys
/// - `SADTALKER_MODE` (`local` or `remote`), `SADTALKER_API_URL`,
///   `SADTALKER_API_KEY`, `SADTALKER_DIR`, `SADTALKER_CHECKPOINT_DIR`
///   override the matching `animation` keys
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed, or
/// if `SADTALKER_MODE` or `STUDIO_MEDIA_RETENTION_HOURS` is unusable.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    load_config_with_env(path, &ProcessEnv)
}

pub fn load_config_with_env(
    path: Option<&str>,
    env: &dyn EnvSource,
) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    if let Some(host) = env.get("STUDIO_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = env.get("STUDIO_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(dir) = env.get("STUDIO_CLIENT_DIR") {
        config.server.client_dir = Some(PathBuf::from(dir));
    }
    if let Some(dir) = env.get("STUDIO_MEDIA_DIR") {
        config.media.dir = PathBuf::from(dir);
    }
    if let Some(hours) = env.get("STUDIO_MEDIA_RETENTION_HOURS") {
        config.media.retention_hours =
            hours.trim().parse().map_err(|e| ConfigError::InvalidEnv {
                name: "STUDIO_MEDIA_RETENTION_HOURS",
                reason: format!("{}", e),
            })?;
    }
    if let Some(level) = env.get("STUDIO_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = env.get("STUDIO_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    if let Some(key) = env.get("GEMINI_API_KEY") {
        config.imagen.api_key = key;
    }

    if let Some(key) = env.get("ELEVENLABS_API_KEY") {
        config.elevenlabs.api_key = key;
    }
    if let Some(agent) = env.get("ELEVENLABS_AGENT_ID") {
        config.elevenlabs.agent_id = agent;
    }
    if let Some(voice) = env.get("ELEVENLABS_VOICE_ID") {
        config.elevenlabs.voice_id = voice;
    }

    if let Some(mode) = env.get("SADTALKER_MODE") {
        config.animation.mode = mode
            .parse()
            .map_err(|reason| ConfigError::InvalidEnv {
                name: "SADTALKER_MODE",
                reason,
            })?;
    }
    if let Some(url) = env.get("SADTALKER_API_URL") {
        config.animation.endpoint = url;
    }
    if let Some(key) = env.get("SADTALKER_API_KEY") {
        config.animation.api_key = key;
    }
    if let Some(dir) = env.get("SADTALKER_DIR") {
        config.animation.sadtalker_dir = PathBuf::from(dir);
    }
    if let Some(dir) = env.get("SADTALKER_CHECKPOINT_DIR") {
        config.animation.checkpoint_dir = PathBuf::from(dir);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use studio_media::AnimationMode;

    #[test]
    fn defaults_without_file() {
        let config = load_config_with_env(None, &HashMap::new()).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.media.dir, PathBuf::from("media"));
        assert_eq!(config.animation.mode, AnimationMode::Local);
        assert!(config.imagen.api_key.is_empty());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config =
            load_config_with_env(Some("/definitely/not/here.toml"), &HashMap::new()).unwrap();
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parses_toml_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 9100

[imagen]
model = "imagen-test"
timeout_secs = 5

[animation]
mode = "remote"
endpoint = "http://gpu-box:7860/animate"

[rate_limit]
video_per_minute = 2
"#,
        )
        .unwrap();

        let config = load_config_with_env(path.to_str(), &HashMap::new()).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.imagen.model, "imagen-test");
        assert_eq!(config.imagen.timeout_secs, 5);
        assert_eq!(config.animation.mode, AnimationMode::Remote);
        assert_eq!(config.animation.endpoint, "http://gpu-box:7860/animate");
        assert_eq!(config.rate_limit.video_per_minute, 2);
        assert_eq!(config.rate_limit.generate_per_minute, 30);
    }

    #[test]
    fn env_overrides_credentials_and_mode() {
        let env = HashMap::from([
            ("GEMINI_API_KEY", "g-key"),
            ("ELEVENLABS_API_KEY", "xi-key"),
            ("ELEVENLABS_AGENT_ID", "agent-1"),
            ("SADTALKER_MODE", "remote"),
            ("SADTALKER_API_URL", "http://localhost:7860/animate"),
            ("STUDIO_PORT", "9200"),
            ("STUDIO_LOG_JSON", "1"),
        ]);
        let config = load_config_with_env(None, &env).unwrap();
        assert_eq!(config.imagen.api_key, "g-key");
        assert_eq!(config.elevenlabs.api_key, "xi-key");
        assert_eq!(config.elevenlabs.agent_id, "agent-1");
        assert_eq!(config.animation.mode, AnimationMode::Remote);
        assert_eq!(config.server.port, 9200);
        assert!(config.logging.json);
    }

    #[test]
    fn unknown_mode_is_an_error() {
        let env = HashMap::from([("SADTALKER_MODE", "quantum")]);
        assert!(matches!(
            load_config_with_env(None, &env),
            Err(ConfigError::InvalidEnv { .. })
        ));
    }

    #[test]
    fn media_retention_from_file_and_env() {
        let config = load_config_with_env(None, &HashMap::new()).unwrap();
        assert_eq!(config.media.retention(), Some(Duration::from_secs(72 * 3600)));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[media]\nretention_hours = 0\nretention_sweep_secs = 60\n").unwrap();
        let config = load_config_with_env(path.to_str(), &HashMap::new()).unwrap();
        assert_eq!(config.media.retention(), None);
        assert_eq!(config.media.retention_sweep_secs, 60);

        let env = HashMap::from([("STUDIO_MEDIA_RETENTION_HOURS", "12")]);
        let config = load_config_with_env(path.to_str(), &env).unwrap();
        assert_eq!(config.media.retention(), Some(Duration::from_secs(12 * 3600)));

        let env = HashMap::from([("STUDIO_MEDIA_RETENTION_HOURS", "a week")]);
        assert!(matches!(
            load_config_with_env(None, &env),
            Err(ConfigError::InvalidEnv { name: "STUDIO_MEDIA_RETENTION_HOURS", .. })
        ));
    }
}
