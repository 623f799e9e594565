//! Avatar configuration and its option sets.
//!
//! An [`AvatarConfig`] is the complete, validated set of presenter attributes
//! submitted to the image step. Raw client input arrives as an
//! [`AvatarForm`] (plain strings, every field optional) and becomes a config
//! only through [`AvatarForm::into_config`], so an unknown option string is a
//! validation failure rather than a silent fallback.

use crate::error::StudioError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum presenter name length, in characters, after trimming.
pub const MAX_NAME_CHARS: usize = 64;

/// Declares a closed option set with a fixed wire label per variant.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal {
            $($(#[$vmeta:meta])* $variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $label)] $variant),+
        }

        impl $name {
            /// Every variant, in catalog order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Returns the wire label for this option.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// Wire labels of every variant, in catalog order.
            pub fn labels() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.as_str()).collect()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = StudioError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($label => Ok($name::$variant),)+
                    other => Err(StudioError::validation(format!(
                        "invalid {}: '{}' (expected one of: {})",
                        $field,
                        other,
                        Self::labels().join(", ")
                    ))),
                }
            }
        }
    };
}

wire_enum! {
    /// Presenter skin tone.
    SkinTone, "skinTone" {
        Light => "light",
        Medium => "medium",
        Dark => "dark",
    }
}

wire_enum! {
    /// Presenter hair style.
    HairStyle, "hairStyle" {
        Natural => "natural",
        Braids => "braids",
        Twists => "twists",
        Straight => "straight",
    }
}

wire_enum! {
    /// Presenter clothing.
    Clothing, "clothing" {
        ProfessionalSuit => "professional_suit",
        Traditional => "traditional",
        Casual => "casual",
        Formal => "formal",
    }
}

wire_enum! {
    /// Presenter personality, reflected in the portrait's expression.
    Personality, "personality" {
        WarmFriendly => "warm_friendly",
        Professional => "professional",
        Patient => "patient",
        Encouraging => "encouraging",
    }
}

wire_enum! {
    /// Portrait background setting.
    Background, "background" {
        Office => "office",
        Traditional => "traditional",
        Neutral => "neutral",
        Government => "government",
    }
}

wire_enum! {
    /// Presenter language and accent.
    Language, "language" {
        EnKe => "en-KE",
        EnUs => "en-US",
        EnGb => "en-GB",
        SwKe => "sw-KE",
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::EnKe
    }
}

/// A complete presenter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarConfig {
    pub name: String,
    pub skin_tone: SkinTone,
    pub hair_style: HairStyle,
    pub clothing: Clothing,
    pub personality: Personality,
    pub background: Background,
    #[serde(default)]
    pub language: Language,
}

impl AvatarConfig {
    /// Checks the free-text field. Enum fields are valid by construction.
    pub fn validate(&self) -> Result<(), StudioError> {
        validate_name(&self.name).map(|_| ())
    }
}

fn validate_name(name: &str) -> Result<String, StudioError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StudioError::validation("name must not be empty"));
    }
    let chars = trimmed.chars().count();
    if chars > MAX_NAME_CHARS {
        return Err(StudioError::validation(format!(
            "name is too long: {} characters (max {})",
            chars, MAX_NAME_CHARS
        )));
    }
    Ok(trimmed.to_string())
}

/// Raw avatar configuration as submitted by a client.
///
/// Accepts both camelCase and snake_case field names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "skin_tone")]
    pub skin_tone: Option<String>,
    #[serde(default, alias = "hair_style")]
    pub hair_style: Option<String>,
    #[serde(default)]
    pub clothing: Option<String>,
    #[serde(default)]
    pub personality: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

fn required<T: FromStr<Err = StudioError>>(
    value: Option<&str>,
    field: &str,
) -> Result<T, StudioError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v.parse(),
        None => Err(StudioError::validation(format!("{} is required", field))),
    }
}

impl AvatarForm {
    /// Parses and validates every field.
    ///
    /// Fails on the first missing or unknown value; `language` falls back to
    /// `en-KE` only when absent.
    pub fn into_config(self) -> Result<AvatarConfig, StudioError> {
        let name = validate_name(self.name.as_deref().unwrap_or_default())?;
        let language = match self.language.as_deref().map(str::trim) {
            None | Some("") => Language::default(),
            Some(v) => v.parse()?,
        };

        Ok(AvatarConfig {
            name,
            skin_tone: required(self.skin_tone.as_deref(), "skinTone")?,
            hair_style: required(self.hair_style.as_deref(), "hairStyle")?,
            clothing: required(self.clothing.as_deref(), "clothing")?,
            personality: required(self.personality.as_deref(), "personality")?,
            background: required(self.background.as_deref(), "background")?,
            language,
        })
    }
}

impl From<&AvatarConfig> for AvatarForm {
    fn from(config: &AvatarConfig) -> Self {
        Self {
            name: Some(config.name.clone()),
            skin_tone: Some(config.skin_tone.to_string()),
            hair_style: Some(config.hair_style.to_string()),
            clothing: Some(config.clothing.to_string()),
            personality: Some(config.personality.to_string()),
            background: Some(config.background.to_string()),
            language: Some(config.language.to_string()),
        }
    }
}

/// An avatar produced by the image step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarImage {
    /// Opaque avatar id, usable as `image_ref` in the video step.
    pub id: String,
    pub name: String,
    /// The description sent to the image-generation service.
    pub prompt_description: String,
    pub status: String,
    /// Where the generated portrait can be fetched.
    pub image_url: String,
    pub mime_type: String,
    pub config: AvatarConfig,
}

/// Success envelope of `POST /avatar/generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateAvatarResponse {
    pub success: bool,
    pub data: AvatarImage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn amara_form() -> AvatarForm {
        AvatarForm {
            name: Some("Amara".to_string()),
            skin_tone: Some("medium".to_string()),
            hair_style: Some("braids".to_string()),
            clothing: Some("professional_suit".to_string()),
            personality: Some("warm_friendly".to_string()),
            background: Some("office".to_string()),
            language: Some("en-KE".to_string()),
        }
    }

    #[test]
    fn form_parses_into_config() {
        let config = amara_form().into_config().unwrap();
        assert_eq!(config.name, "Amara");
        assert_eq!(config.skin_tone, SkinTone::Medium);
        assert_eq!(config.hair_style, HairStyle::Braids);
        assert_eq!(config.clothing, Clothing::ProfessionalSuit);
        assert_eq!(config.language, Language::EnKe);
    }

    #[test]
    fn form_accepts_snake_case_fields() {
        let json = r#"{"name":"Amara","skin_tone":"dark","hair_style":"twists",
            "clothing":"casual","personality":"patient","background":"neutral"}"#;
        let form: AvatarForm = serde_json::from_str(json).unwrap();
        let config = form.into_config().unwrap();
        assert_eq!(config.skin_tone, SkinTone::Dark);
        assert_eq!(config.hair_style, HairStyle::Twists);
        assert_eq!(config.language, Language::EnKe);
    }

    #[test]
    fn unknown_option_is_validation_error() {
        let mut form = amara_form();
        form.hair_style = Some("mohawk".to_string());
        let err = form.into_config().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("hairStyle"));
    }

    #[test]
    fn missing_field_is_named() {
        let mut form = amara_form();
        form.background = None;
        let err = form.into_config().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.message, "background is required");
    }

    #[test]
    fn blank_name_rejected() {
        let mut form = amara_form();
        form.name = Some("   ".to_string());
        assert_eq!(form.into_config().unwrap_err().kind, ErrorKind::Validation);
    }

    #[test]
    fn long_name_rejected() {
        let mut form = amara_form();
        form.name = Some("a".repeat(MAX_NAME_CHARS + 1));
        assert!(form.into_config().is_err());
    }

    #[test]
    fn config_round_trips_as_camel_case() {
        let config = amara_form().into_config().unwrap();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["skinTone"], "medium");
        assert_eq!(json["clothing"], "professional_suit");
        assert_eq!(json["language"], "en-KE");
    }

    #[test]
    fn labels_follow_catalog_order() {
        assert_eq!(Language::labels(), vec!["en-KE", "en-US", "en-GB", "sw-KE"]);
        assert_eq!(SkinTone::ALL.len(), 3);
    }
}
