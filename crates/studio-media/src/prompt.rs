//! Portrait description templating.
//!
//! The description is a pure function of the [`AvatarConfig`]: the same
//! config always yields byte-identical text, which keeps generated portraits
//! reproducible and lets tests assert on the exact wording.

use studio_types::{
    AvatarConfig, Background, Clothing, HairStyle, Language, Personality, SkinTone,
};

pub fn skin_tone_phrase(tone: SkinTone) -> &'static str {
    match tone {
        SkinTone::Light => "light brown complexion",
        SkinTone::Medium => "medium brown complexion",
        SkinTone::Dark => "rich dark brown complexion",
    }
}

pub fn hair_style_phrase(style: HairStyle) -> &'static str {
    match style {
        HairStyle::Natural => "natural textured afro hair",
        HairStyle::Braids => "beautiful neatly styled braids",
        HairStyle::Twists => "twisted protective hairstyle",
        HairStyle::Straight => "straight well-groomed hair",
    }
}

pub fn clothing_phrase(clothing: Clothing) -> &'static str {
    match clothing {
        Clothing::ProfessionalSuit => "a professional business suit",
        Clothing::Traditional => "authentic African traditional attire",
        Clothing::Casual => "smart business casual clothing",
        Clothing::Formal => "formal government official attire",
    }
}

pub fn personality_phrase(personality: Personality) -> &'static str {
    match personality {
        Personality::WarmFriendly => "warm, welcoming and friendly expression",
        Personality::Professional => "professional, confident and authoritative demeanor",
        Personality::Patient => "patient, understanding and calm presence",
        Personality::Encouraging => "encouraging, energetic and inspirational attitude",
    }
}

pub fn background_phrase(background: Background) -> &'static str {
    match background {
        Background::Office => "modern professional office environment",
        Background::Traditional => "cultural African background setting",
        Background::Neutral => "clean neutral gray background",
        Background::Government => "official government office backdrop",
    }
}

pub fn language_phrase(language: Language) -> &'static str {
    match language {
        Language::EnKe => "English (Kenya)",
        Language::EnUs => "English (United States)",
        Language::EnGb => "English (United Kingdom)",
        Language::SwKe => "Swahili (Kenya)",
    }
}

/// Builds the image-generation description for a presenter.
pub fn build_prompt(config: &AvatarConfig) -> String {
    format!(
        "Professional high-quality portrait of an African presenter named {name}, \
         with {skin} skin, {hair}, wearing {clothing}, \
         with a {personality}, in front of a {background}. \
         Studio lighting, professional photography, 4K quality, \
         portrait orientation, head and shoulders, looking at camera. \
         African presenter style for {language} language content. \
         Professional, authentic and inspiring appearance.",
        name = config.name.trim(),
        skin = skin_tone_phrase(config.skin_tone),
        hair = hair_style_phrase(config.hair_style),
        clothing = clothing_phrase(config.clothing),
        personality = personality_phrase(config.personality),
        background = background_phrase(config.background),
        language = language_phrase(config.language),
    )
}
