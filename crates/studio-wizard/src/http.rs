//! [`StudioBackend`] over the studio server's HTTP API.

use crate::backend::StudioBackend;
use crate::state::{AudioClip, VideoBlob};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::json;
use std::time::Duration;
use studio_types::{
    AnimationParams, AvatarConfig, AvatarForm, AvatarImage, ErrorBody, GenerateAvatarResponse,
    StudioError,
};
use tracing::{debug, info};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Talks to a running `studio-server`.
///
/// Sets no overall request timeout; the driver bounds each step.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("avatar-studio/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "could not build the studio HTTP client, falling back to defaults");
                reqwest::Client::new()
            });
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn transport_error(err: reqwest::Error) -> StudioError {
    if err.is_timeout() {
        StudioError::timeout(format!("studio server did not answer: {}", err))
    } else {
        StudioError::external(format!("could not reach the studio server: {}", err))
    }
}

/// Turns a non-success response into the server's kind-tagged error.
async fn error_from_response(response: reqwest::Response) -> StudioError {
    let status = response.status();
    let body = response.bytes().await.unwrap_or_default();
    match serde_json::from_slice::<ErrorBody>(&body) {
        Ok(error) => error.into(),
        Err(_) if status == reqwest::StatusCode::TOO_MANY_REQUESTS => {
            StudioError::external("too many requests; wait a minute and retry")
        }
        Err(_) => StudioError::external(format!(
            "studio server returned HTTP {}: {}",
            status.as_u16(),
            String::from_utf8_lossy(&body).chars().take(200).collect::<String>()
        )),
    }
}

fn content_type(response: &reqwest::Response, fallback: &str) -> String {
    response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(fallback)
        .to_string()
}

#[async_trait]
impl StudioBackend for HttpBackend {
    async fn generate_avatar(&self, config: &AvatarConfig) -> Result<AvatarImage, StudioError> {
        debug!(name = %config.name, "requesting avatar portrait");
        let response = self
            .client
            .post(self.url("/avatar/generate"))
            .json(&AvatarForm::from(config))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: GenerateAvatarResponse = response
            .json()
            .await
            .map_err(|e| StudioError::external(format!("unexpected avatar response: {}", e)))?;
        info!(avatar_id = %body.data.id, "avatar portrait ready");
        Ok(body.data)
    }

    async fn generate_video(
        &self,
        avatar: &AvatarImage,
        audio: &AudioClip,
        params: &AnimationParams,
    ) -> Result<VideoBlob, StudioError> {
        let audio_part = Part::bytes(audio.data.to_vec())
            .file_name(audio.file_name.clone())
            .mime_str(&audio.media_type)
            .map_err(|e| StudioError::validation(format!("invalid audio media type: {}", e)))?;

        let form = Form::new()
            .text("image_ref", avatar.id.clone())
            .part("audio", audio_part)
            .text("pose_style", params.pose_style.as_u8().to_string())
            .text("exp_scale", params.exp_scale.to_string())
            .text("still", params.still.to_string())
            .text("preprocess", params.preprocess.as_str());

        debug!(avatar_id = %avatar.id, audio_bytes = audio.data.len(), "requesting talking video");
        let response = self
            .client
            .post(self.url("/avatar/generate-talking-video"))
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let content_type = content_type(&response, "video/mp4");
        let data = response.bytes().await.map_err(transport_error)?;
        if data.is_empty() {
            return Err(StudioError::external("studio server returned an empty video"));
        }
        info!(bytes = data.len(), "talking video ready");
        Ok(VideoBlob { data, content_type })
    }

    async fn synthesize_speech(
        &self,
        text: &str,
        voice: Option<&str>,
    ) -> Result<AudioClip, StudioError> {
        let response = self
            .client
            .post(self.url("/avatar/speech"))
            .json(&json!({ "text": text, "voice": voice }))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let media_type = content_type(&response, "audio/mpeg");
        let data = response.bytes().await.map_err(transport_error)?;
        Ok(AudioClip::new(data, media_type, "speech.mp3"))
    }
}
