use crate::backend::StudioBackend;
use crate::wizard::{Command, Completion, Job, JobOutcome, JobRequest, Wizard, WizardError};
use std::time::Duration;
use studio_types::StudioError;

/// Default bound on the image step.
pub const DEFAULT_IMAGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on the animation step. Lip-sync rendering takes minutes.
pub const DEFAULT_VIDEO_TIMEOUT: Duration = Duration::from_secs(600);

/// Runs wizard commands end to end against a backend.
///
/// Dropping the future returned by [`WizardDriver::run`] drops the backend
/// call with it; the job then stays outstanding until `cancel`, `back` or
/// `reset`.
pub struct WizardDriver<B: StudioBackend> {
    wizard: Wizard,
    backend: B,
    image_timeout: Duration,
    video_timeout: Duration,
}

impl<B: StudioBackend> WizardDriver<B> {
    pub fn new(backend: B) -> Self {
        Self {
            wizard: Wizard::new(),
            backend,
            image_timeout: DEFAULT_IMAGE_TIMEOUT,
            video_timeout: DEFAULT_VIDEO_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, image: Duration, video: Duration) -> Self {
        self.image_timeout = image;
        self.video_timeout = video;
        self
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    pub fn wizard_mut(&mut self) -> &mut Wizard {
        &mut self.wizard
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Applies a command, performing its external call if it has one.
    pub async fn run(&mut self, command: Command) -> Result<Completion, WizardError> {
        match self.wizard.dispatch(command)? {
            None => Ok(Completion::Applied),
            Some(job) => {
                let ticket = job.ticket;
                let outcome = self.execute(job).await;
                self.wizard.complete(ticket, outcome)
            }
        }
    }

    async fn execute(&self, job: Job) -> Result<JobOutcome, StudioError> {
        match job.request {
            JobRequest::Avatar(config) => {
                let call = self.backend.generate_avatar(&config);
                match tokio::time::timeout(self.image_timeout, call).await {
                    Ok(result) => result.map(JobOutcome::Avatar),
                    Err(_) => Err(StudioError::timeout(format!(
                        "avatar generation did not finish within {} seconds",
                        self.image_timeout.as_secs()
                    ))),
                }
            }
            JobRequest::Video {
                avatar,
                audio,
                params,
            } => {
                let call = self.backend.generate_video(&avatar, &audio, &params);
                match tokio::time::timeout(self.video_timeout, call).await {
                    Ok(result) => result.map(JobOutcome::Video),
                    Err(_) => Err(StudioError::timeout(format!(
                        "video generation did not finish within {} seconds",
                        self.video_timeout.as_secs()
                    ))),
                }
            }
        }
    }
}
