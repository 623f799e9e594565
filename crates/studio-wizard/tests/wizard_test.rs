use bytes::Bytes;
use studio_types::{
    AnimationParams, AvatarConfig, AvatarImage, Background, Clothing, ErrorKind, HairStyle,
    Language, Personality, SkinTone, StudioError,
};
use studio_wizard::{
    AudioClip, AvatarDraft, Command, Completion, JobOutcome, JobRequest, Step, VideoBlob, Wizard,
    WizardError, WizardState,
};

fn amara() -> AvatarDraft {
    AvatarDraft {
        name: "Amara".to_string(),
        skin_tone: Some(SkinTone::Medium),
        hair_style: Some(HairStyle::Braids),
        clothing: Some(Clothing::ProfessionalSuit),
        personality: Some(Personality::WarmFriendly),
        background: Some(Background::Office),
        language: Language::EnKe,
    }
}

fn portrait(config: &AvatarConfig, id: &str) -> AvatarImage {
    AvatarImage {
        id: id.to_string(),
        name: config.name.clone(),
        prompt_description: "Professional portrait of an African presenter".to_string(),
        status: "generated".to_string(),
        image_url: format!("/media/avatars/{}.png", id),
        mime_type: "image/png".to_string(),
        config: config.clone(),
    }
}

fn mp3() -> AudioClip {
    AudioClip::new(Bytes::from_static(b"ID3fake"), "audio/mpeg", "welcome.mp3")
}

fn video() -> VideoBlob {
    VideoBlob {
        data: Bytes::from_static(b"fake-mp4"),
        content_type: "video/mp4".to_string(),
    }
}

/// Drives the wizard to AwaitingAudio with a portrait id.
fn awaiting_audio(wizard: &mut Wizard, id: &str) {
    let job = wizard.begin(Command::GenerateAvatar(amara())).unwrap();
    let JobRequest::Avatar(config) = &job.request else {
        panic!("expected an avatar job");
    };
    let outcome = Ok(JobOutcome::Avatar(portrait(config, id)));
    assert_eq!(wizard.complete(job.ticket, outcome).unwrap(), Completion::Applied);
}

fn at_result(wizard: &mut Wizard) {
    awaiting_audio(wizard, "avatar_amara_0000aaaa");
    let job = wizard
        .begin(Command::GenerateVideo {
            audio: mp3(),
            params: AnimationParams::default(),
        })
        .unwrap();
    assert_eq!(
        wizard.complete(job.ticket, Ok(JobOutcome::Video(video()))).unwrap(),
        Completion::Applied
    );
}

#[test]
fn starts_customizing() {
    let wizard = Wizard::new();
    assert_eq!(wizard.step(), Step::Customizing);
    assert!(!wizard.is_busy());
    assert!(wizard.last_error().is_none());
}

#[test]
fn full_happy_path() {
    let mut wizard = Wizard::new();

    let job = wizard.begin(Command::GenerateAvatar(amara())).unwrap();
    assert!(wizard.is_busy());
    assert_eq!(wizard.step(), Step::Customizing);

    let JobRequest::Avatar(config) = &job.request else {
        panic!("expected an avatar job");
    };
    assert_eq!(config.name, "Amara");
    let avatar = portrait(config, "avatar_amara_1234abcd");
    wizard
        .complete(job.ticket, Ok(JobOutcome::Avatar(avatar.clone())))
        .unwrap();
    assert_eq!(wizard.step(), Step::AwaitingAudio);
    assert_eq!(wizard.state().avatar(), Some(&avatar));
    assert!(!wizard.is_busy());

    let job = wizard
        .begin(Command::GenerateVideo {
            audio: mp3(),
            params: AnimationParams::default(),
        })
        .unwrap();
    match &job.request {
        JobRequest::Video { avatar: a, audio, .. } => {
            assert_eq!(a.id, "avatar_amara_1234abcd");
            assert_eq!(audio.media_type, "audio/mpeg");
        }
        other => panic!("expected a video job, got {:?}", other),
    }
    wizard
        .complete(job.ticket, Ok(JobOutcome::Video(video())))
        .unwrap();

    assert_eq!(wizard.step(), Step::Result);
    assert_eq!(wizard.state().video(), Some(&video()));
    assert_eq!(wizard.state().avatar(), Some(&avatar));
}

#[test]
fn incomplete_config_is_rejected_and_recorded() {
    let mut wizard = Wizard::new();
    let mut draft = amara();
    draft.background = None;

    let err = wizard.begin(Command::GenerateAvatar(draft)).unwrap_err();
    match err {
        WizardError::Rejected(e) => {
            assert_eq!(e.kind, ErrorKind::Validation);
            assert!(e.message.contains("background"));
        }
        other => panic!("expected Rejected, got {:?}", other),
    }
    assert_eq!(wizard.step(), Step::Customizing);
    assert!(!wizard.is_busy());
    assert_eq!(wizard.last_error().unwrap().kind, ErrorKind::Validation);
}

#[test]
fn unsupported_audio_is_rejected_before_any_job() {
    let mut wizard = Wizard::new();
    awaiting_audio(&mut wizard, "avatar_amara_1234abcd");

    let flac = AudioClip::new(Bytes::from_static(b"fLaC"), "audio/flac", "song.flac");
    let err = wizard
        .begin(Command::GenerateVideo {
            audio: flac,
            params: AnimationParams::default(),
        })
        .unwrap_err();

    assert!(matches!(err, WizardError::Rejected(ref e) if e.kind == ErrorKind::Validation));
    assert!(!wizard.is_busy());
    assert_eq!(wizard.step(), Step::AwaitingAudio);
    assert_eq!(wizard.last_error().unwrap().kind, ErrorKind::Validation);
}

#[test]
fn out_of_range_params_are_rejected() {
    let mut wizard = Wizard::new();
    awaiting_audio(&mut wizard, "avatar_amara_1234abcd");

    let params = AnimationParams {
        exp_scale: 4.0,
        ..AnimationParams::default()
    };
    let err = wizard
        .begin(Command::GenerateVideo {
            audio: mp3(),
            params,
        })
        .unwrap_err();
    assert!(matches!(err, WizardError::Rejected(_)));
}

#[test]
fn video_requires_a_portrait() {
    let mut wizard = Wizard::new();
    let err = wizard
        .begin(Command::GenerateVideo {
            audio: mp3(),
            params: AnimationParams::default(),
        })
        .unwrap_err();
    assert_eq!(
        err,
        WizardError::InvalidTransition {
            step: Step::Customizing,
            command: "generate a video",
        }
    );
}

#[test]
fn failure_leaves_state_unchanged_and_allows_retry() {
    let mut wizard = Wizard::new();
    awaiting_audio(&mut wizard, "avatar_amara_1234abcd");
    let before = wizard.state().clone();

    let job = wizard
        .begin(Command::GenerateVideo {
            audio: mp3(),
            params: AnimationParams::default(),
        })
        .unwrap();
    let completion = wizard
        .complete(
            job.ticket,
            Err(StudioError::input_quality("no face detected in the portrait")),
        )
        .unwrap();

    assert!(matches!(completion, Completion::Failed(ref e) if e.kind == ErrorKind::InputQuality));
    assert_eq!(wizard.state(), &before);
    assert!(!wizard.is_busy());
    assert_eq!(wizard.last_error().unwrap().kind, ErrorKind::InputQuality);

    // Immediate retry is allowed and a success clears the error.
    let job = wizard
        .begin(Command::GenerateVideo {
            audio: mp3(),
            params: AnimationParams::default(),
        })
        .unwrap();
    wizard
        .complete(job.ticket, Ok(JobOutcome::Video(video())))
        .unwrap();
    assert_eq!(wizard.step(), Step::Result);
    assert!(wizard.last_error().is_none());
}

#[test]
fn second_begin_while_busy_is_refused() {
    let mut wizard = Wizard::new();
    let _job = wizard.begin(Command::GenerateAvatar(amara())).unwrap();

    assert_eq!(
        wizard.begin(Command::GenerateAvatar(amara())).unwrap_err(),
        WizardError::Busy
    );
}

#[test]
fn back_from_awaiting_audio_clears_portrait() {
    let mut wizard = Wizard::new();
    awaiting_audio(&mut wizard, "avatar_amara_1234abcd");

    wizard.back();
    assert_eq!(wizard.state(), &WizardState::Customizing);
    assert!(wizard.state().avatar().is_none());
}

#[test]
fn back_from_result_keeps_portrait_and_drops_video() {
    let mut wizard = Wizard::new();
    at_result(&mut wizard);

    wizard.back();
    assert_eq!(wizard.step(), Step::AwaitingAudio);
    assert!(wizard.state().avatar().is_some());
    assert!(wizard.state().video().is_none());
}

#[test]
fn back_from_customizing_is_a_no_op() {
    let mut wizard = Wizard::new();
    wizard.dispatch(Command::Back).unwrap();
    assert_eq!(wizard.state(), &WizardState::Customizing);
}

#[test]
fn reset_clears_everything() {
    let mut wizard = Wizard::new();
    at_result(&mut wizard);

    assert!(wizard.dispatch(Command::Reset).unwrap().is_none());
    assert_eq!(wizard.state(), &WizardState::Customizing);
    assert!(wizard.state().avatar().is_none());
    assert!(wizard.state().video().is_none());
}

#[test]
fn stale_completion_after_back_is_discarded() {
    let mut wizard = Wizard::new();
    awaiting_audio(&mut wizard, "avatar_amara_1234abcd");

    let job = wizard
        .begin(Command::GenerateVideo {
            audio: mp3(),
            params: AnimationParams::default(),
        })
        .unwrap();
    wizard.back();
    assert!(!wizard.is_busy());

    let completion = wizard
        .complete(job.ticket, Ok(JobOutcome::Video(video())))
        .unwrap();
    assert_eq!(completion, Completion::Discarded);
    assert_eq!(wizard.state(), &WizardState::Customizing);
}

#[test]
fn stale_completion_after_cancel_does_not_overwrite_new_job() {
    let mut wizard = Wizard::new();

    let first = wizard.begin(Command::GenerateAvatar(amara())).unwrap();
    wizard.cancel();
    let second = wizard.begin(Command::GenerateAvatar(amara())).unwrap();

    let JobRequest::Avatar(config) = &first.request else {
        panic!("expected an avatar job");
    };
    let stale = portrait(config, "avatar_amara_00000001");
    assert_eq!(
        wizard
            .complete(first.ticket, Ok(JobOutcome::Avatar(stale)))
            .unwrap(),
        Completion::Discarded
    );
    assert!(wizard.is_busy());

    let fresh = portrait(config, "avatar_amara_00000002");
    wizard
        .complete(second.ticket, Ok(JobOutcome::Avatar(fresh)))
        .unwrap();
    assert_eq!(wizard.state().avatar().unwrap().id, "avatar_amara_00000002");
}

#[test]
fn regenerating_replaces_portrait_only_on_success() {
    let mut wizard = Wizard::new();
    awaiting_audio(&mut wizard, "avatar_amara_1234abcd");

    let mut draft = amara();
    draft.hair_style = Some(HairStyle::Twists);
    let job = wizard.begin(Command::GenerateAvatar(draft.clone())).unwrap();
    wizard
        .complete(job.ticket, Err(StudioError::external("imagen request failed")))
        .unwrap();
    assert_eq!(wizard.state().avatar().unwrap().id, "avatar_amara_1234abcd");

    let job = wizard.begin(Command::GenerateAvatar(draft)).unwrap();
    let JobRequest::Avatar(config) = &job.request else {
        panic!("expected an avatar job");
    };
    let replacement = portrait(config, "avatar_amara_5678ef00");
    wizard
        .complete(job.ticket, Ok(JobOutcome::Avatar(replacement)))
        .unwrap();

    match wizard.state() {
        WizardState::AwaitingAudio { config, avatar } => {
            assert_eq!(config.hair_style, HairStyle::Twists);
            assert_eq!(avatar.id, "avatar_amara_5678ef00");
        }
        other => panic!("expected AwaitingAudio, got {:?}", other),
    }
}

#[test]
fn mismatched_outcome_releases_the_job() {
    let mut wizard = Wizard::new();
    let job = wizard.begin(Command::GenerateAvatar(amara())).unwrap();

    assert_eq!(
        wizard
            .complete(job.ticket, Ok(JobOutcome::Video(video())))
            .unwrap_err(),
        WizardError::MismatchedOutcome
    );
    assert!(!wizard.is_busy());
    assert_eq!(wizard.step(), Step::Customizing);

    // The abandoned ticket is stale now, and a new job can start.
    assert_eq!(
        wizard
            .complete(job.ticket, Ok(JobOutcome::Video(video())))
            .unwrap(),
        Completion::Discarded
    );
    assert!(wizard.begin(Command::GenerateAvatar(amara())).is_ok());
}
