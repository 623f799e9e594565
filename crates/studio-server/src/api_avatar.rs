//! Avatar API handlers: portrait generation, option catalog, voices, speech
//! and the service health summary.

use crate::{api::ApiError, store::new_avatar_id, AppState};
use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use studio_types::{AvatarForm, AvatarImage, Configurations, GenerateAvatarResponse};
use studio_voice::{ContentType, SpeechRequest, VOICES};

/// Handler for `POST /avatar/generate`.
///
/// Generates a portrait from the submitted configuration, stores it in the
/// media directory and returns its id and URL.
pub async fn generate_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<AvatarForm>, JsonRejection>,
) -> Result<Json<GenerateAvatarResponse>, ApiError> {
    let Json(form) = payload?;
    let config = form.into_config()?;

    tracing::info!(
        name = %config.name,
        skin_tone = %config.skin_tone,
        hair_style = %config.hair_style,
        language = %config.language,
        "generating avatar portrait"
    );

    let image = state.gateway.generate(&config).await?;

    let id = new_avatar_id(&config.name);
    let image_url = state
        .store
        .save(&id, &image.data, image.media_type)
        .await
        .map_err(|e| ApiError::InternalServerError(format!("failed to store portrait: {}", e)))?;

    Ok(Json(GenerateAvatarResponse {
        success: true,
        data: AvatarImage {
            id,
            name: config.name.clone(),
            prompt_description: image.prompt,
            status: "generated".to_string(),
            image_url,
            mime_type: image.media_type.as_str().to_string(),
            config,
        },
    }))
}

/// Handler for `GET /avatar/configurations`.
pub async fn configurations_handler() -> Json<Configurations> {
    Json(Configurations::catalog())
}

/// Handler for `GET /avatar/voices`.
pub async fn voices_handler() -> Json<Value> {
    Json(json!({ "voices": VOICES }))
}

/// Handler for `GET /avatar/avatars`.
///
/// Lists the portraits currently stored, newest first.
pub async fn avatars_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let avatars = state.store.list().await?;
    Ok(Json(json!({ "success": true, "avatars": avatars })))
}

/// Handler for `GET /avatar/health`.
///
/// Reports which external services have credentials or endpoints
/// configured. Does not call them.
pub async fn health_handler(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "services": {
            "imagen": {
                "configured": state.gateway.is_configured(),
                "model": state.gateway.model(),
            },
            "elevenlabs": {
                "configured": state.tts.is_configured(),
                "agentConfigured": !state.tts.agent_id().is_empty(),
            },
            "animation": {
                "mode": state.relay.mode().as_str(),
                "configured": state.relay.is_configured(),
            },
        },
    }))
}

/// Request body for `POST /avatar/speech`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechBody {
    pub text: String,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default, alias = "content_type")]
    pub content_type: Option<String>,
}

/// Handler for `POST /avatar/speech`.
///
/// Returns the synthesized audio as `audio/mpeg`.
pub async fn speech_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<SpeechBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = payload?;

    let mut request = SpeechRequest::new(body.text);
    request.voice = body.voice;
    request.content_type = body
        .content_type
        .as_deref()
        .map(ContentType::parse_lenient)
        .unwrap_or_default();

    let speech = state.tts.synthesize(&request).await?;

    Ok((
        [
            (header::CONTENT_TYPE, speech.media_type.as_str().to_string()),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        speech.audio,
    )
        .into_response())
}
