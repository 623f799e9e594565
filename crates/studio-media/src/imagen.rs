use crate::config::ImagenConfig;
use crate::error::GenerationError;
use crate::prompt::build_prompt;
use base64::Engine;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{json, Value};
use studio_types::{AvatarConfig, ImageMediaType};
use tracing::{info, warn};

const SERVICE: &str = "imagen";

/// A portrait returned by the image-generation service.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    /// The description the portrait was generated from.
    pub prompt: String,
    pub data: Bytes,
    pub media_type: ImageMediaType,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
    rai_filtered_reason: Option<String>,
}

/// Builds the `:predict` request body for one portrait.
pub fn predict_request_body(prompt: &str) -> Value {
    json!({
        "instances": [{ "prompt": prompt }],
        "parameters": {
            "sampleCount": 1,
            "aspectRatio": "1:1",
            "personGeneration": "allow_adult"
        }
    })
}

/// Gateway to the Imagen image-generation API.
///
/// Holds no state besides the HTTP client; nothing is persisted here.
#[derive(Debug, Clone)]
pub struct ImageGateway {
    config: ImagenConfig,
    client: reqwest::Client,
}

impl ImageGateway {
    pub fn new(config: ImagenConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("avatar-studio/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "could not build the Imagen HTTP client, falling back to defaults");
                reqwest::Client::new()
            });
        Self { config, client }
    }

    pub fn is_configured(&self) -> bool {
        !self.config.api_key.trim().is_empty()
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn predict_url(&self) -> String {
        format!(
            "{}/models/{}:predict",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// Generates a portrait for the given presenter configuration.
    ///
    /// The config is validated before credentials are checked, and both are
    /// checked before any network call.
    pub async fn generate(&self, avatar: &AvatarConfig) -> Result<GeneratedImage, GenerationError> {
        avatar.validate()?;

        if !self.is_configured() {
            return Err(GenerationError::MissingCredentials { service: SERVICE });
        }

        let prompt = build_prompt(avatar);
        info!(
            name = %avatar.name,
            model = %self.config.model,
            prompt_len = prompt.len(),
            "requesting portrait generation"
        );

        let timeout = self.config.timeout();
        let response = self
            .client
            .post(self.predict_url())
            .timeout(timeout)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&predict_request_body(&prompt))
            .send()
            .await
            .map_err(|e| GenerationError::from_reqwest(SERVICE, timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "image generation request failed");
            return Err(GenerationError::from_status(SERVICE, status.as_u16(), &body));
        }

        let parsed: PredictResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::malformed(SERVICE, e.to_string()))?;

        let prediction = parsed
            .predictions
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::malformed(SERVICE, "no predictions returned"))?;

        let encoded = match (prediction.bytes_base64_encoded, prediction.rai_filtered_reason) {
            (Some(encoded), _) => encoded,
            (None, Some(reason)) => {
                warn!(reason = %reason, "portrait was filtered by the service");
                return Err(GenerationError::ContentRejected {
                    service: SERVICE,
                    reason,
                });
            }
            (None, None) => {
                return Err(GenerationError::malformed(SERVICE, "prediction has no image data"))
            }
        };

        let data = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| GenerationError::malformed(SERVICE, format!("invalid base64: {}", e)))?;

        let media_type = prediction
            .mime_type
            .as_deref()
            .and_then(|m| ImageMediaType::parse_declared(m).ok())
            .or_else(|| ImageMediaType::detect(&data))
            .ok_or_else(|| GenerationError::malformed(SERVICE, "unrecognized image format"))?;

        info!(
            name = %avatar.name,
            bytes = data.len(),
            media_type = %media_type,
            "portrait generated"
        );

        Ok(GeneratedImage {
            prompt,
            data: Bytes::from(data),
            media_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_carries_prompt() {
        let body = predict_request_body("a portrait");
        assert_eq!(body["instances"][0]["prompt"], "a portrait");
        assert_eq!(body["parameters"]["sampleCount"], 1);
    }

    #[test]
    fn predict_url_joins_model() {
        let gateway = ImageGateway::new(ImagenConfig::new("k", "http://localhost:9/v1beta/"));
        assert_eq!(
            gateway.predict_url(),
            "http://localhost:9/v1beta/models/imagen-3.0-generate-002:predict"
        );
    }

    #[test]
    fn unconfigured_without_key() {
        assert!(!ImageGateway::new(ImagenConfig::default()).is_configured());
    }
}
