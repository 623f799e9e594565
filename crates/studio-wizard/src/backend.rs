use crate::state::{AudioClip, VideoBlob};
use async_trait::async_trait;
use studio_types::{AnimationParams, AvatarConfig, AvatarImage, StudioError};

/// The generation services as seen by the wizard.
///
/// Implementations report every failure as a kind-tagged [`StudioError`].
#[async_trait]
pub trait StudioBackend: Send + Sync {
    /// Generates a portrait for the configuration.
    async fn generate_avatar(&self, config: &AvatarConfig) -> Result<AvatarImage, StudioError>;

    /// Animates a previously generated portrait with the audio clip.
    async fn generate_video(
        &self,
        avatar: &AvatarImage,
        audio: &AudioClip,
        params: &AnimationParams,
    ) -> Result<VideoBlob, StudioError>;

    /// Converts text to an audio clip usable in the video step.
    async fn synthesize_speech(
        &self,
        text: &str,
        voice: Option<&str>,
    ) -> Result<AudioClip, StudioError>;
}
