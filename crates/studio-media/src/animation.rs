//! Lip-sync relay to SadTalker.
//!
//! Accepts a portrait and an audio clip, forwards them to the animation
//! service and hands the resulting video back as a byte stream. The service
//! either runs as a local `inference.py` process or behind a remote HTTP
//! endpoint accepting one multipart request.

use crate::config::{AnimationConfig, AnimationMode};
use crate::error::{truncate, GenerationError};
use bytes::Bytes;
use futures_util::stream::{self, BoxStream};
use futures_util::{StreamExt, TryStreamExt};
use reqwest::multipart::{Form, Part};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use studio_types::{
    AnimationParams, AudioMediaType, ImageMediaType, MAX_AUDIO_BYTES, MAX_IMAGE_BYTES,
};
use tokio::process::Command;
use tracing::{info, warn};

const SERVICE: &str = "sadtalker";

/// Phrases the service uses when it cannot find a face in the portrait.
const NO_FACE_MARKERS: &[&str] = &[
    "no face",
    "face not detected",
    "face is not detected",
    "cannot detect face",
    "can't get the coeffs",
];

/// Returns `true` if a service message reports a missing face.
pub fn mentions_missing_face(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    NO_FACE_MARKERS.iter().any(|m| lower.contains(m))
}

/// A validated animation request.
#[derive(Debug, Clone)]
pub struct AnimationRequest {
    pub image: Bytes,
    pub image_type: ImageMediaType,
    pub audio: Bytes,
    pub audio_type: AudioMediaType,
    pub params: AnimationParams,
}

impl AnimationRequest {
    /// Validates the inputs of one animation.
    ///
    /// The audio's declared media type is checked first; nothing here
    /// touches the network.
    pub fn new(
        image: Bytes,
        declared_image_type: Option<&str>,
        audio: Bytes,
        declared_audio_type: &str,
        params: AnimationParams,
    ) -> Result<Self, GenerationError> {
        let audio_type = AudioMediaType::parse_declared(declared_audio_type)
            .map_err(|e| GenerationError::UnsupportedMediaType(e.message))?;

        if audio.is_empty() {
            return Err(GenerationError::Validation("audio file is empty".to_string()));
        }
        if audio.len() > MAX_AUDIO_BYTES {
            return Err(GenerationError::Validation(format!(
                "audio file too large: {} bytes (max {})",
                audio.len(),
                MAX_AUDIO_BYTES
            )));
        }

        params.validate()?;

        let image_type = match declared_image_type {
            Some(declared) if declared != "application/octet-stream" => {
                ImageMediaType::parse_declared(declared)
                    .map_err(|e| GenerationError::UnsupportedMediaType(e.message))?
            }
            _ => ImageMediaType::detect(&image).ok_or_else(|| {
                GenerationError::UnsupportedMediaType("unsupported image format".to_string())
            })?,
        };

        if image.is_empty() {
            return Err(GenerationError::Validation("image file is empty".to_string()));
        }
        if image.len() > MAX_IMAGE_BYTES {
            return Err(GenerationError::Validation(format!(
                "image file too large: {} bytes (max {})",
                image.len(),
                MAX_IMAGE_BYTES
            )));
        }

        Ok(Self {
            image,
            image_type,
            audio,
            audio_type,
            params,
        })
    }
}

pub type ByteStream = BoxStream<'static, Result<Bytes, std::io::Error>>;

/// A generated video, streamed back from the animation service.
pub struct VideoStream {
    pub content_type: String,
    pub content_length: Option<u64>,
    pub body: ByteStream,
}

impl fmt::Debug for VideoStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoStream")
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

impl VideoStream {
    fn buffered(content_type: &str, data: Bytes) -> Self {
        Self {
            content_type: content_type.to_string(),
            content_length: Some(data.len() as u64),
            body: stream::once(async move { Ok(data) }).boxed(),
        }
    }

    /// Reads the whole video into memory.
    pub async fn collect(self) -> Result<Bytes, std::io::Error> {
        let chunks: Vec<Bytes> = self.body.try_collect().await?;
        Ok(Bytes::from(chunks.concat()))
    }
}

/// Client for the lip-sync animation service.
#[derive(Debug, Clone)]
pub struct AnimationRelay {
    config: AnimationConfig,
    client: reqwest::Client,
}

impl AnimationRelay {
    pub fn new(config: AnimationConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("avatar-studio/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "could not build the animation HTTP client, falling back to defaults");
                reqwest::Client::new()
            });
        Self { config, client }
    }

    pub fn mode(&self) -> AnimationMode {
        self.config.mode
    }

    pub fn is_configured(&self) -> bool {
        match self.config.mode {
            AnimationMode::Remote => !self.config.endpoint.trim().is_empty(),
            AnimationMode::Local => self.config.sadtalker_dir.join("inference.py").exists(),
        }
    }

    /// Animates the portrait with the audio and returns the video.
    pub async fn animate(&self, request: AnimationRequest) -> Result<VideoStream, GenerationError> {
        info!(
            mode = self.config.mode.as_str(),
            image_bytes = request.image.len(),
            audio_bytes = request.audio.len(),
            audio_type = %request.audio_type,
            pose_style = request.params.pose_style.as_u8(),
            exp_scale = request.params.exp_scale,
            "starting talking-head animation"
        );

        match self.config.mode {
            AnimationMode::Remote => self.animate_remote(request).await,
            AnimationMode::Local => self.animate_local(request).await,
        }
    }

    async fn animate_remote(&self, request: AnimationRequest) -> Result<VideoStream, GenerationError> {
        if self.config.endpoint.trim().is_empty() {
            return Err(GenerationError::NotConfigured {
                service: SERVICE,
                detail: "remote endpoint is empty".to_string(),
            });
        }

        let image_part = Part::bytes(request.image.to_vec())
            .file_name(format!("image.{}", request.image_type.extension()))
            .mime_str(request.image_type.as_str())
            .map_err(|e| GenerationError::Validation(e.to_string()))?;
        let audio_part = Part::bytes(request.audio.to_vec())
            .file_name(format!("audio.{}", request.audio_type.extension()))
            .mime_str(request.audio_type.as_str())
            .map_err(|e| GenerationError::Validation(e.to_string()))?;

        let params = request.params;
        let form = Form::new()
            .part("image", image_part)
            .part("audio", audio_part)
            .text("pose_style", params.pose_style.as_u8().to_string())
            .text("exp_scale", params.exp_scale.to_string())
            .text("still", params.still.to_string())
            .text("preprocess", params.preprocess.as_str());

        let timeout = self.config.timeout();
        let mut builder = self
            .client
            .post(&self.config.endpoint)
            .timeout(timeout)
            .multipart(form);
        if !self.config.api_key.is_empty() {
            builder = builder.bearer_auth(&self.config.api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| GenerationError::from_reqwest(SERVICE, timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if mentions_missing_face(&body) {
                return Err(GenerationError::NoFaceDetected(truncate(&body)));
            }
            warn!(status = status.as_u16(), "animation service returned an error");
            return Err(GenerationError::from_status(SERVICE, status.as_u16(), &body));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("video/mp4")
            .to_string();

        // A structured body on success means the service reported a problem
        // instead of sending a video.
        if content_type.starts_with("application/json") || content_type.starts_with("text/") {
            let body = response.text().await.unwrap_or_default();
            if mentions_missing_face(&body) {
                return Err(GenerationError::NoFaceDetected(truncate(&body)));
            }
            return Err(GenerationError::malformed(
                SERVICE,
                format!("expected a video, got {}: {}", content_type, truncate(&body)),
            ));
        }

        let content_length = response.content_length();
        let body = response
            .bytes_stream()
            .map_err(std::io::Error::other)
            .boxed();

        Ok(VideoStream {
            content_type,
            content_length,
            body,
        })
    }

    async fn animate_local(&self, request: AnimationRequest) -> Result<VideoStream, GenerationError> {
        let script = self.config.sadtalker_dir.join("inference.py");
        if !script.exists() {
            return Err(GenerationError::NotConfigured {
                service: SERVICE,
                detail: format!("inference script not found: {:?}", script),
            });
        }

        let workdir = tempfile::tempdir()?;
        let image_path = workdir
            .path()
            .join(format!("source.{}", request.image_type.extension()));
        let audio_path = workdir
            .path()
            .join(format!("driven.{}", request.audio_type.extension()));
        let result_dir = workdir.path().join("results");

        tokio::fs::write(&image_path, &request.image).await?;
        tokio::fs::write(&audio_path, &request.audio).await?;
        tokio::fs::create_dir_all(&result_dir).await?;

        let params = request.params;
        let mut command = Command::new(&self.config.python);
        command
            .current_dir(&self.config.sadtalker_dir)
            .arg("inference.py")
            .arg("--driven_audio")
            .arg(&audio_path)
            .arg("--source_image")
            .arg(&image_path)
            .arg("--result_dir")
            .arg(&result_dir)
            .arg("--checkpoint_dir")
            .arg(absolutize(&self.config.checkpoint_dir)?)
            .arg("--preprocess")
            .arg(params.preprocess.as_str())
            .arg("--expression_scale")
            .arg(params.exp_scale.to_string())
            .arg("--pose_style")
            .arg(params.pose_style.as_u8().to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if params.still {
            command.arg("--still");
        }

        let child = command.spawn().map_err(|e| GenerationError::ExternalService {
            service: SERVICE,
            status: None,
            message: format!("failed to spawn inference process: {}", e),
        })?;

        let timeout = self.config.timeout();
        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| GenerationError::Timeout {
                service: SERVICE,
                after: timeout,
            })??;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);

        if !output.status.success() {
            if mentions_missing_face(&stderr) || mentions_missing_face(&stdout) {
                return Err(GenerationError::NoFaceDetected(truncate(&stderr)));
            }
            return Err(GenerationError::ExternalService {
                service: SERVICE,
                status: None,
                message: format!("inference exited with {}: {}", output.status, truncate(&stderr)),
            });
        }

        let Some(video_path) = find_video(&result_dir).await? else {
            if mentions_missing_face(&stderr) || mentions_missing_face(&stdout) {
                return Err(GenerationError::NoFaceDetected(truncate(&stderr)));
            }
            return Err(GenerationError::ExternalService {
                service: SERVICE,
                status: None,
                message: "inference finished without producing a video".to_string(),
            });
        };

        let data = tokio::fs::read(&video_path).await?;
        info!(path = ?video_path, bytes = data.len(), "local animation finished");

        Ok(VideoStream::buffered("video/mp4", Bytes::from(data)))
    }
}

fn absolutize(path: &Path) -> Result<PathBuf, std::io::Error> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Finds the first `.mp4` below `dir` (SadTalker nests results in a
/// timestamped folder).
async fn find_video(dir: &Path) -> Result<Option<PathBuf>, std::io::Error> {
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&current).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                pending.push(path);
            } else if path.extension().and_then(|e| e.to_str()) == Some("mp4") {
                return Ok(Some(path));
            }
        }
    }
    Ok(None)
}
