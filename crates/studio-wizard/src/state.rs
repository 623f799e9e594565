//! Data carried by the wizard between steps.

use bytes::Bytes;
use std::fmt;
use studio_types::{
    AvatarConfig, AvatarImage, Background, Clothing, HairStyle, Language, Personality, SkinTone,
    StudioError,
};

/// The avatar form as the user fills it in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvatarDraft {
    pub name: String,
    pub skin_tone: Option<SkinTone>,
    pub hair_style: Option<HairStyle>,
    pub clothing: Option<Clothing>,
    pub personality: Option<Personality>,
    pub background: Option<Background>,
    pub language: Language,
}

fn missing(field: &str) -> StudioError {
    StudioError::validation(format!("{} is required", field))
}

impl AvatarDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Produces the submitted configuration, or an error naming the first
    /// missing field.
    pub fn complete(&self) -> Result<AvatarConfig, StudioError> {
        if self.name.trim().is_empty() {
            return Err(missing("name"));
        }
        let config = AvatarConfig {
            name: self.name.trim().to_string(),
            skin_tone: self.skin_tone.ok_or_else(|| missing("skinTone"))?,
            hair_style: self.hair_style.ok_or_else(|| missing("hairStyle"))?,
            clothing: self.clothing.ok_or_else(|| missing("clothing"))?,
            personality: self.personality.ok_or_else(|| missing("personality"))?,
            background: self.background.ok_or_else(|| missing("background"))?,
            language: self.language,
        };
        config.validate()?;
        Ok(config)
    }
}

impl From<&AvatarConfig> for AvatarDraft {
    fn from(config: &AvatarConfig) -> Self {
        Self {
            name: config.name.clone(),
            skin_tone: Some(config.skin_tone),
            hair_style: Some(config.hair_style),
            clothing: Some(config.clothing),
            personality: Some(config.personality),
            background: Some(config.background),
            language: config.language,
        }
    }
}

/// An audio clip supplied for the video step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub data: Bytes,
    /// Declared media type, checked against the allow-list before upload.
    pub media_type: String,
    pub file_name: String,
}

impl AudioClip {
    pub fn new(data: impl Into<Bytes>, media_type: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            media_type: media_type.into(),
            file_name: file_name.into(),
        }
    }
}

/// A generated talking-head video.
#[derive(Clone, PartialEq, Eq)]
pub struct VideoBlob {
    pub data: Bytes,
    pub content_type: String,
}

impl fmt::Debug for VideoBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoBlob")
            .field("bytes", &self.data.len())
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// Wizard step, without the data it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Customizing,
    AwaitingAudio,
    Result,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::Customizing => "customizing",
            Step::AwaitingAudio => "awaiting audio",
            Step::Result => "showing the result",
        })
    }
}

/// Where the wizard is. Each variant holds only what is valid in it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WizardState {
    #[default]
    Customizing,
    /// The portrait exists; it doubles as the preview.
    AwaitingAudio {
        config: AvatarConfig,
        avatar: AvatarImage,
    },
    Result {
        config: AvatarConfig,
        avatar: AvatarImage,
        video: VideoBlob,
    },
}

impl WizardState {
    pub fn step(&self) -> Step {
        match self {
            WizardState::Customizing => Step::Customizing,
            WizardState::AwaitingAudio { .. } => Step::AwaitingAudio,
            WizardState::Result { .. } => Step::Result,
        }
    }

    pub fn avatar(&self) -> Option<&AvatarImage> {
        match self {
            WizardState::Customizing => None,
            WizardState::AwaitingAudio { avatar, .. } | WizardState::Result { avatar, .. } => {
                Some(avatar)
            }
        }
    }

    pub fn video(&self) -> Option<&VideoBlob> {
        match self {
            WizardState::Result { video, .. } => Some(video),
            _ => None,
        }
    }
}
