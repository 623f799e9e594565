//! Speech synthesis for the avatar presenter.
//!
//! Wraps the ElevenLabs text-to-speech API, provides a small catalog of
//! presenter voices, and shapes text for natural delivery (emphasis on key
//! terms, pauses between sentences) before it is spoken.

pub mod config;
pub mod error;
pub mod tts;
pub mod voices;

pub use config::ElevenLabsConfig;
pub use error::VoiceError;
pub use tts::{SpeechRequest, SynthesizedSpeech, TtsService, MAX_TTS_INPUT_CHARS};
pub use voices::{find_voice, shape_text, ContentType, PresenterVoice, VOICES};
