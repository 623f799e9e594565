//! Media types and animation parameters for the video step.

use crate::error::StudioError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum accepted audio upload size: 50 MiB.
pub const MAX_AUDIO_BYTES: usize = 50 * 1024 * 1024;

/// Maximum accepted portrait upload size: 20 MiB.
pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// Inclusive bounds for the expression-intensity scalar.
pub const EXP_SCALE_RANGE: (f32, f32) = (0.0, 2.0);

/// Strips parameters (`; codecs=...`) and normalizes case.
fn essence(declared: &str) -> String {
    declared
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Audio formats accepted by the animation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioMediaType {
    #[serde(rename = "audio/mpeg")]
    Mpeg,
    #[serde(rename = "audio/wav")]
    Wav,
    #[serde(rename = "audio/ogg")]
    Ogg,
}

impl AudioMediaType {
    pub const ALL: &'static [AudioMediaType] = &[Self::Mpeg, Self::Wav, Self::Ogg];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mpeg => "audio/mpeg",
            Self::Wav => "audio/wav",
            Self::Ogg => "audio/ogg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Mpeg => "mp3",
            Self::Wav => "wav",
            Self::Ogg => "ogg",
        }
    }

    /// Checks a declared media type against the allow-list.
    pub fn parse_declared(declared: &str) -> Result<Self, StudioError> {
        match essence(declared).as_str() {
            "audio/mpeg" => Ok(Self::Mpeg),
            "audio/wav" => Ok(Self::Wav),
            "audio/ogg" => Ok(Self::Ogg),
            _ => Err(StudioError::validation(format!(
                "unsupported media type: '{}' (accepted: audio/mpeg, audio/wav, audio/ogg)",
                declared.trim()
            ))),
        }
    }
}

impl fmt::Display for AudioMediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Portrait formats accepted by the animation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageMediaType {
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/webp")]
    Webp,
}

impl ImageMediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }

    /// Maps a file extension back to a media type.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    /// Checks a declared media type against the allow-list.
    pub fn parse_declared(declared: &str) -> Result<Self, StudioError> {
        match essence(declared).as_str() {
            "image/jpeg" | "image/jpg" => Ok(Self::Jpeg),
            "image/png" => Ok(Self::Png),
            "image/webp" => Ok(Self::Webp),
            _ => Err(StudioError::validation(format!(
                "unsupported media type: '{}' (accepted: image/jpeg, image/png, image/webp)",
                declared.trim()
            ))),
        }
    }

    /// Detects the format from the first bytes of a file.
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.len() >= 3 && data[..3] == [0xFF, 0xD8, 0xFF] {
            Some(Self::Jpeg)
        } else if data.len() >= 8 && data[..8] == [137, 80, 78, 71, 13, 10, 26, 10] {
            Some(Self::Png)
        } else if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else {
            None
        }
    }
}

impl fmt::Display for ImageMediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Head-movement style passed to the lip-sync service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum PoseStyle {
    /// No head movement.
    #[default]
    Still = 0,
    /// Natural head motion.
    Natural = 1,
    /// More expressive movement.
    Expressive = 2,
}

impl PoseStyle {
    pub const ALL: &'static [PoseStyle] = &[Self::Still, Self::Natural, Self::Expressive];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Still),
            1 => Some(Self::Natural),
            2 => Some(Self::Expressive),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Still => "Still",
            Self::Natural => "Natural",
            Self::Expressive => "Expressive",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Still => "No head movement",
            Self::Natural => "Natural head motion",
            Self::Expressive => "More expressive movement",
        }
    }
}

impl TryFrom<u8> for PoseStyle {
    type Error = StudioError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_u8(code).ok_or_else(|| {
            StudioError::validation(format!("invalid pose_style: {} (expected 0, 1 or 2)", code))
        })
    }
}

impl From<PoseStyle> for u8 {
    fn from(style: PoseStyle) -> Self {
        style as u8
    }
}

/// Face preprocessing mode applied by the lip-sync service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preprocess {
    #[default]
    Crop,
    Resize,
    Full,
}

impl Preprocess {
    pub const ALL: &'static [Preprocess] = &[Self::Crop, Self::Resize, Self::Full];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Crop => "crop",
            Self::Resize => "resize",
            Self::Full => "full",
        }
    }
}

impl FromStr for Preprocess {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "crop" => Ok(Self::Crop),
            "resize" => Ok(Self::Resize),
            "full" => Ok(Self::Full),
            other => Err(StudioError::validation(format!(
                "invalid preprocess mode: '{}' (expected crop, resize or full)",
                other
            ))),
        }
    }
}

/// Optional animation controls for the video step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationParams {
    #[serde(default)]
    pub pose_style: PoseStyle,
    #[serde(default = "default_exp_scale")]
    pub exp_scale: f32,
    /// Animate the mouth only.
    #[serde(default)]
    pub still: bool,
    #[serde(default)]
    pub preprocess: Preprocess,
}

fn default_exp_scale() -> f32 {
    1.0
}

impl Default for AnimationParams {
    fn default() -> Self {
        Self {
            pose_style: PoseStyle::default(),
            exp_scale: default_exp_scale(),
            still: false,
            preprocess: Preprocess::default(),
        }
    }
}

impl AnimationParams {
    pub fn validate(&self) -> Result<(), StudioError> {
        let (min, max) = EXP_SCALE_RANGE;
        if !self.exp_scale.is_finite() || self.exp_scale < min || self.exp_scale > max {
            return Err(StudioError::validation(format!(
                "exp_scale must be between {:.1} and {:.1}, got {}",
                min, max, self.exp_scale
            )));
        }
        Ok(())
    }
}
