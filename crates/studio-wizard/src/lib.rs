//! Client side of Avatar Studio.
//!
//! - [`wizard`]: the three-step state machine (customize, supply audio,
//!   view the result), free of I/O.
//! - [`backend`]: the generation services as an async trait, with
//!   [`http::HttpBackend`] talking to `studio-server`.
//! - [`driver`]: runs wizard commands against a backend with per-step
//!   timeouts.

pub mod backend;
pub mod driver;
pub mod http;
pub mod state;
pub mod wizard;

pub use backend::StudioBackend;
pub use driver::{WizardDriver, DEFAULT_IMAGE_TIMEOUT, DEFAULT_VIDEO_TIMEOUT};
pub use http::HttpBackend;
pub use state::{AudioClip, AvatarDraft, Step, VideoBlob, WizardState};
pub use wizard::{Command, Completion, Job, JobOutcome, JobRequest, Ticket, Wizard, WizardError};
