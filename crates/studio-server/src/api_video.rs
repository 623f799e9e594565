//! Talking-head video handlers.
//!
//! Both endpoints take a portrait (uploaded, or referenced by the id returned
//! from `POST /avatar/generate`) plus animation controls, and stream the
//! video produced by the lip-sync service straight back to the caller.

use crate::{api::ApiError, AppState};
use axum::{
    body::Body,
    extract::{Extension, Multipart},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use std::sync::Arc;
use studio_media::{AnimationRequest, VideoStream};
use studio_types::{AnimationParams, AudioMediaType, PoseStyle, MAX_AUDIO_BYTES, MAX_IMAGE_BYTES};
use studio_voice::{ContentType, SpeechRequest};

/// Body limit for the video routes: largest audio plus largest image plus
/// room for the form fields.
pub const MAX_VIDEO_REQUEST_BYTES: usize = MAX_AUDIO_BYTES + MAX_IMAGE_BYTES + 2 * 1024 * 1024;

const VIDEO_FILE_NAME: &str = "talking_avatar.mp4";

/// A file part of the multipart form.
#[derive(Debug)]
struct Upload {
    data: Bytes,
    content_type: Option<String>,
    file_name: Option<String>,
}

/// The parsed multipart form shared by both video endpoints.
#[derive(Debug, Default)]
struct VideoForm {
    image: Option<Upload>,
    image_ref: Option<String>,
    audio: Option<Upload>,
    text: Option<String>,
    voice: Option<String>,
    content_type: Option<String>,
    pose_style: Option<String>,
    exp_scale: Option<String>,
    still: Option<String>,
    preprocess: Option<String>,
}

fn multipart_error(e: impl std::fmt::Display) -> ApiError {
    ApiError::bad_request(format!("multipart error: {}", e))
}

async fn read_form(mut multipart: Multipart) -> Result<VideoForm, ApiError> {
    let mut form = VideoForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" | "audio" => {
                let content_type = field.content_type().map(str::to_string);
                let file_name = field.file_name().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?;
                let upload = Upload {
                    data,
                    content_type,
                    file_name,
                };
                if name == "image" {
                    form.image = Some(upload);
                } else {
                    form.audio = Some(upload);
                }
            }
            _ => {
                let value = field.text().await.map_err(multipart_error)?;
                let value = Some(value.trim().to_string()).filter(|v| !v.is_empty());
                match name.as_str() {
                    "image_ref" | "imageRef" => form.image_ref = value,
                    "text" => form.text = value,
                    "voice" => form.voice = value,
                    "content_type" | "contentType" => form.content_type = value,
                    "pose_style" | "poseStyle" => form.pose_style = value,
                    "exp_scale" | "expScale" => form.exp_scale = value,
                    "still" => form.still = value,
                    "preprocess" => form.preprocess = value,
                    other => tracing::debug!(field = %other, "ignoring unknown form field"),
                }
            }
        }
    }

    Ok(form)
}

/// Guesses an audio media type from a file name when the part carries none.
fn audio_type_from_file_name(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "mp3" | "mpeg" => Some("audio/mpeg"),
        "wav" => Some("audio/wav"),
        "ogg" | "oga" => Some("audio/ogg"),
        _ => None,
    }
}

impl Upload {
    fn declared_audio_type(&self) -> String {
        match self.content_type.as_deref() {
            Some(ct) if ct != "application/octet-stream" => ct.to_string(),
            other => self
                .file_name
                .as_deref()
                .and_then(audio_type_from_file_name)
                .or(other)
                .unwrap_or("application/octet-stream")
                .to_string(),
        }
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, ApiError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ApiError::bad_request(format!(
            "invalid {}: '{}' (expected true or false)",
            field, value
        ))),
    }
}

impl VideoForm {
    fn params(&self) -> Result<AnimationParams, ApiError> {
        let mut params = AnimationParams::default();

        if let Some(value) = &self.pose_style {
            params.pose_style = value
                .parse::<u8>()
                .ok()
                .and_then(PoseStyle::from_u8)
                .ok_or_else(|| {
                    ApiError::bad_request(format!(
                        "invalid pose_style: '{}' (expected 0, 1 or 2)",
                        value
                    ))
                })?;
        }
        if let Some(value) = &self.exp_scale {
            params.exp_scale = value.parse().map_err(|_| {
                ApiError::bad_request(format!("invalid exp_scale: '{}'", value))
            })?;
        }
        if let Some(value) = &self.still {
            params.still = parse_bool("still", value)?;
        }
        if let Some(value) = &self.preprocess {
            params.preprocess = value.parse()?;
        }

        params.validate()?;
        Ok(params)
    }

    /// Resolves the portrait from the upload or the stored avatar.
    async fn portrait(
        &mut self,
        state: &AppState,
    ) -> Result<(Bytes, Option<String>), ApiError> {
        if let Some(image) = self.image.take() {
            return Ok((image.data, image.content_type));
        }
        let Some(id) = self.image_ref.as_deref() else {
            return Err(ApiError::bad_request(
                "an image file or an image_ref is required",
            ));
        };
        match state.store.load(id).await {
            Ok(Some((data, media_type))) => Ok((data, Some(media_type.as_str().to_string()))),
            Ok(None) => Err(ApiError::bad_request(format!("unknown image_ref: '{}'", id))),
            Err(e) => Err(ApiError::InternalServerError(format!(
                "failed to read portrait: {}",
                e
            ))),
        }
    }
}

fn video_response(video: VideoStream) -> Response {
    let content_type = HeaderValue::from_str(&video.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("video/mp4"));
    let disposition = format!("attachment; filename=\"{}\"", VIDEO_FILE_NAME);

    let mut response = Body::from_stream(video.body).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    if let Some(length) = video.content_length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }
    response
}

/// Handler for `POST /avatar/generate-talking-video`.
///
/// Multipart fields: `image` or `image_ref`, `audio`, and optionally
/// `pose_style`, `exp_scale`, `still`, `preprocess`.
pub async fn generate_talking_video_handler(
    Extension(state): Extension<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut form = read_form(multipart).await?;

    let audio = form
        .audio
        .take()
        .ok_or_else(|| ApiError::bad_request("no audio file provided"))?;
    let declared_audio = audio.declared_audio_type();
    AudioMediaType::parse_declared(&declared_audio)
        .map_err(|e| ApiError::UnsupportedMediaType(e.message))?;

    let params = form.params()?;
    let (image, image_type) = form.portrait(&state).await?;

    let request = AnimationRequest::new(
        image,
        image_type.as_deref(),
        audio.data,
        &declared_audio,
        params,
    )?;

    let video = state.relay.animate(request).await?;
    Ok(video_response(video))
}

/// Handler for `POST /avatar/text-to-video`.
///
/// Synthesizes `text` with the chosen voice, then animates the portrait with
/// the resulting audio.
pub async fn text_to_video_handler(
    Extension(state): Extension<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut form = read_form(multipart).await?;

    let text = form
        .text
        .take()
        .ok_or_else(|| ApiError::bad_request("text is required"))?;
    let params = form.params()?;
    let (image, image_type) = form.portrait(&state).await?;

    let mut speech_request = SpeechRequest::new(text);
    speech_request.voice = form.voice.take();
    speech_request.content_type = form
        .content_type
        .as_deref()
        .map(ContentType::parse_lenient)
        .unwrap_or_default();

    let speech = state.tts.synthesize(&speech_request).await?;
    tracing::info!(
        voice = %speech.voice_name,
        audio_bytes = speech.audio.len(),
        "speech ready for animation"
    );

    let request = AnimationRequest::new(
        image,
        image_type.as_deref(),
        speech.audio,
        speech.media_type.as_str(),
        params,
    )?;

    let video = state.relay.animate(request).await?;
    Ok(video_response(video))
}
