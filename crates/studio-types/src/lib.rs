//! Shared types for Avatar Studio.
//!
//! This crate holds the data model exchanged between the server and the
//! wizard client: the avatar configuration and its closed option sets,
//! animation parameters, accepted media types, and the kind-tagged error
//! taxonomy. It has no I/O and no knowledge of the external services.

pub mod avatar;
pub mod error;
pub mod media;

pub use avatar::{
    AvatarConfig, AvatarForm, AvatarImage, Background, Clothing, GenerateAvatarResponse,
    HairStyle, Language, Personality, SkinTone, MAX_NAME_CHARS,
};
pub use error::{ErrorBody, ErrorKind, StudioError};
pub use media::{
    AnimationParams, AudioMediaType, ImageMediaType, PoseStyle, Preprocess, EXP_SCALE_RANGE,
    MAX_AUDIO_BYTES, MAX_IMAGE_BYTES,
};

use serde::Serialize;

/// A selectable pose style as listed in the option catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoseStyleOption {
    pub id: u8,
    pub name: &'static str,
    pub description: &'static str,
}

/// Option sets used to populate the configuration form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Configurations {
    pub skin_tones: Vec<&'static str>,
    pub hair_styles: Vec<&'static str>,
    pub clothing: Vec<&'static str>,
    pub personalities: Vec<&'static str>,
    pub backgrounds: Vec<&'static str>,
    pub languages: Vec<&'static str>,
    pub pose_styles: Vec<PoseStyleOption>,
    pub preprocess_modes: Vec<&'static str>,
    pub audio_media_types: Vec<&'static str>,
}

impl Configurations {
    /// Builds the catalog from the option enums.
    pub fn catalog() -> Self {
        Self {
            skin_tones: SkinTone::labels(),
            hair_styles: HairStyle::labels(),
            clothing: Clothing::labels(),
            personalities: Personality::labels(),
            backgrounds: Background::labels(),
            languages: Language::labels(),
            pose_styles: PoseStyle::ALL
                .iter()
                .map(|p| PoseStyleOption {
                    id: p.as_u8(),
                    name: p.label(),
                    description: p.description(),
                })
                .collect(),
            preprocess_modes: Preprocess::ALL.iter().map(|p| p.as_str()).collect(),
            audio_media_types: AudioMediaType::ALL.iter().map(|a| a.as_str()).collect(),
        }
    }
}
