//! The wizard state machine.
//!
//! The wizard never performs I/O. Generation commands are split in two:
//! [`Wizard::begin`] checks preconditions and hands out a [`Job`] describing
//! the external call, and [`Wizard::complete`] applies its outcome. Only one
//! job may be outstanding. `back`, `reset` and `cancel` advance an epoch so
//! that a late completion for an abandoned job is discarded.

use crate::state::{AudioClip, AvatarDraft, Step, VideoBlob, WizardState};
use std::fmt;
use studio_types::{
    AnimationParams, AudioMediaType, AvatarConfig, AvatarImage, StudioError,
};
use thiserror::Error;

/// A user action.
#[derive(Debug, Clone)]
pub enum Command {
    /// Generate (or regenerate) the portrait.
    GenerateAvatar(AvatarDraft),
    /// Animate the current portrait with an audio clip.
    GenerateVideo {
        audio: AudioClip,
        params: AnimationParams,
    },
    Back,
    Reset,
}

impl Command {
    fn label(&self) -> &'static str {
        match self {
            Command::GenerateAvatar(_) => "generate an avatar",
            Command::GenerateVideo { .. } => "generate a video",
            Command::Back => "go back",
            Command::Reset => "reset",
        }
    }
}

/// Identifies one started job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    epoch: u64,
    seq: u64,
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.epoch, self.seq)
    }
}

/// The external call a job stands for.
#[derive(Debug, Clone)]
pub enum JobRequest {
    Avatar(AvatarConfig),
    Video {
        avatar: AvatarImage,
        audio: AudioClip,
        params: AnimationParams,
    },
}

/// A started generation, to be finished with [`Wizard::complete`].
#[derive(Debug, Clone)]
pub struct Job {
    pub ticket: Ticket,
    pub request: JobRequest,
}

/// Result of a job's external call.
#[derive(Debug, Clone)]
pub enum JobOutcome {
    Avatar(AvatarImage),
    Video(VideoBlob),
}

/// What [`Wizard::complete`] did with an outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// The state advanced.
    Applied,
    /// The call failed; the state is unchanged and the error recorded.
    Failed(StudioError),
    /// The job had been abandoned; nothing changed.
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WizardError {
    #[error("a generation request is already in flight")]
    Busy,

    #[error("cannot {command} while {step}")]
    InvalidTransition { step: Step, command: &'static str },

    /// A precondition on the command's input failed. Also recorded as the
    /// wizard's last error.
    #[error("{0}")]
    Rejected(StudioError),

    /// The job is abandoned and the state left unchanged.
    #[error("outcome does not match the in-flight request")]
    MismatchedOutcome,
}

#[derive(Debug, Clone)]
struct InFlight {
    ticket: Ticket,
    config: Option<AvatarConfig>,
}

/// One user's pass through the avatar wizard.
#[derive(Debug, Default)]
pub struct Wizard {
    state: WizardState,
    last_error: Option<StudioError>,
    in_flight: Option<InFlight>,
    epoch: u64,
    seq: u64,
}

impl Wizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn step(&self) -> Step {
        self.state.step()
    }

    /// The error of the most recent failed command, if it has not been
    /// superseded by a successful one.
    pub fn last_error(&self) -> Option<&StudioError> {
        self.last_error.as_ref()
    }

    /// `true` while a job is outstanding; generation controls should be
    /// disabled.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Applies `Back`/`Reset` immediately and starts generation commands.
    pub fn dispatch(&mut self, command: Command) -> Result<Option<Job>, WizardError> {
        match command {
            Command::Back => {
                self.back();
                Ok(None)
            }
            Command::Reset => {
                self.reset();
                Ok(None)
            }
            generate => self.begin(generate).map(Some),
        }
    }

    /// Starts a generation command.
    pub fn begin(&mut self, command: Command) -> Result<Job, WizardError> {
        if self.is_busy() {
            return Err(WizardError::Busy);
        }

        let step = self.step();
        let invalid = WizardError::InvalidTransition {
            step,
            command: command.label(),
        };
        let (request, config) = match command {
            Command::GenerateAvatar(draft) => {
                if step == Step::Result {
                    return Err(invalid);
                }
                let config = draft.complete().map_err(|e| self.reject(e))?;
                (JobRequest::Avatar(config.clone()), Some(config))
            }
            Command::GenerateVideo { audio, params } => {
                let Some(avatar) = self.state.avatar().filter(|_| step == Step::AwaitingAudio)
                else {
                    return Err(invalid);
                };
                let avatar = avatar.clone();
                AudioMediaType::parse_declared(&audio.media_type).map_err(|e| self.reject(e))?;
                params.validate().map_err(|e| self.reject(e))?;
                (
                    JobRequest::Video {
                        avatar,
                        audio,
                        params,
                    },
                    None,
                )
            }
            Command::Back | Command::Reset => return Err(invalid),
        };

        self.seq += 1;
        let ticket = Ticket {
            epoch: self.epoch,
            seq: self.seq,
        };
        self.in_flight = Some(InFlight { ticket, config });
        tracing::debug!(%ticket, %step, "generation started");

        Ok(Job { ticket, request })
    }

    fn reject(&mut self, err: StudioError) -> WizardError {
        self.last_error = Some(err.clone());
        WizardError::Rejected(err)
    }

    /// Applies the outcome of a job.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        outcome: Result<JobOutcome, StudioError>,
    ) -> Result<Completion, WizardError> {
        let current = match &self.in_flight {
            Some(in_flight) if in_flight.ticket == ticket && ticket.epoch == self.epoch => {
                in_flight.clone()
            }
            _ => {
                tracing::debug!(%ticket, "discarding completion of an abandoned job");
                return Ok(Completion::Discarded);
            }
        };

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(err) => {
                self.in_flight = None;
                tracing::info!(%ticket, kind = %err.kind, "generation failed");
                self.last_error = Some(err.clone());
                return Ok(Completion::Failed(err));
            }
        };

        let next = match (outcome, &self.state, current.config) {
            (
                JobOutcome::Avatar(avatar),
                WizardState::Customizing | WizardState::AwaitingAudio { .. },
                Some(config),
            ) => WizardState::AwaitingAudio { config, avatar },
            (JobOutcome::Video(video), WizardState::AwaitingAudio { config, avatar }, None) => {
                WizardState::Result {
                    config: config.clone(),
                    avatar: avatar.clone(),
                    video,
                }
            }
            _ => {
                self.in_flight = None;
                tracing::warn!(%ticket, "outcome does not match the in-flight request");
                return Err(WizardError::MismatchedOutcome);
            }
        };

        self.in_flight = None;
        self.last_error = None;
        self.state = next;
        tracing::debug!(%ticket, step = %self.step(), "generation applied");
        Ok(Completion::Applied)
    }

    /// Abandons the in-flight job, if any, without changing the step.
    pub fn cancel(&mut self) {
        if self.in_flight.take().is_some() {
            tracing::debug!("in-flight generation cancelled");
        }
        self.epoch += 1;
    }

    /// Steps back: Result returns to AwaitingAudio dropping the video,
    /// AwaitingAudio returns to Customizing dropping the portrait.
    pub fn back(&mut self) {
        self.cancel();
        self.last_error = None;
        self.state = match std::mem::take(&mut self.state) {
            WizardState::Customizing | WizardState::AwaitingAudio { .. } => {
                WizardState::Customizing
            }
            WizardState::Result { config, avatar, .. } => {
                WizardState::AwaitingAudio { config, avatar }
            }
        };
    }

    /// Returns to Customizing and clears everything.
    pub fn reset(&mut self) {
        self.cancel();
        self.last_error = None;
        self.state = WizardState::Customizing;
    }
}
