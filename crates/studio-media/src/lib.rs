//! Clients for the external generation services.
//!
//! - [`imagen`]: the portrait gateway, turning an avatar configuration into
//!   a deterministic description and calling the Imagen API with it.
//! - [`animation`]: the lip-sync relay, forwarding a portrait and an audio
//!   clip to SadTalker and streaming the resulting video back.
//!
//! Both report failures as [`GenerationError`], whose [`GenerationError::kind`]
//! separates caller-fixable, operator-fixable and transient problems.

pub mod animation;
pub mod config;
pub mod error;
pub mod imagen;
pub mod prompt;

pub use animation::{mentions_missing_face, AnimationRelay, AnimationRequest, VideoStream};
pub use config::{AnimationConfig, AnimationMode, ImagenConfig};
pub use error::GenerationError;
pub use imagen::{GeneratedImage, ImageGateway};
pub use prompt::build_prompt;
