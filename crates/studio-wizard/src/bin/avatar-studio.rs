//! Avatar Studio command-line client.
//!
//! Walks the wizard against a running studio server: generates the
//! portrait, animates it with an audio file (or with speech synthesized from
//! `--text`) and writes the video to disk.
//!
//! ```bash
//! avatar-studio --name Amara --skin-tone medium --hair-style braids \
//!     --clothing professional_suit --personality warm_friendly \
//!     --background office --audio welcome.mp3 --output amara.mp4
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use studio_types::{
    AnimationParams, Background, Clothing, HairStyle, Language, Personality, PoseStyle,
    Preprocess, SkinTone, StudioError,
};
use studio_wizard::{
    AudioClip, AvatarDraft, Command, Completion, HttpBackend, StudioBackend, WizardDriver,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Generate a talking-head presenter video
#[derive(Parser, Debug)]
#[command(name = "avatar-studio", version)]
struct Args {
    /// Studio server base URL
    #[arg(long, env = "STUDIO_SERVER_URL", default_value = "http://127.0.0.1:8000")]
    server: String,

    /// Presenter name
    #[arg(long)]
    name: String,

    #[arg(long)]
    skin_tone: Option<SkinTone>,

    #[arg(long)]
    hair_style: Option<HairStyle>,

    #[arg(long)]
    clothing: Option<Clothing>,

    #[arg(long)]
    personality: Option<Personality>,

    #[arg(long)]
    background: Option<Background>,

    #[arg(long, default_value = "en-KE")]
    language: Language,

    /// Audio file to lip-sync (mp3, wav or ogg)
    #[arg(long, value_name = "FILE", conflicts_with = "text")]
    audio: Option<PathBuf>,

    /// Declared media type of the audio file; guessed from the extension
    /// when omitted
    #[arg(long, value_name = "MIME")]
    audio_type: Option<String>,

    /// Text to speak instead of an audio file
    #[arg(long)]
    text: Option<String>,

    /// Catalog voice for --text
    #[arg(long)]
    voice: Option<String>,

    /// Head movement: 0 still, 1 natural, 2 expressive
    #[arg(long, default_value_t = 0)]
    pose_style: u8,

    /// Expression intensity (0.0 to 2.0)
    #[arg(long, default_value_t = 1.0)]
    exp_scale: f32,

    /// Animate the mouth only
    #[arg(long)]
    still: bool,

    #[arg(long, default_value = "crop")]
    preprocess: Preprocess,

    /// Where to write the video
    #[arg(long, short, default_value = "talking_avatar.mp4")]
    output: PathBuf,

    /// Seconds to wait for the portrait
    #[arg(long, default_value_t = 30)]
    image_timeout: u64,

    /// Seconds to wait for the video
    #[arg(long, default_value_t = 600)]
    video_timeout: u64,

    /// Stop after the portrait and print its URL
    #[arg(long)]
    image_only: bool,
}

fn guess_audio_type(path: &std::path::Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("ogg") | Some("oga") => "audio/ogg",
        Some("flac") => "audio/flac",
        _ => "application/octet-stream",
    }
}

fn describe(err: &StudioError) -> String {
    format!("{} ({}). {}", err.message, err.kind, err.kind.guidance())
}

fn finish(completion: Completion, step: &str) -> Result<()> {
    match completion {
        Completion::Applied => Ok(()),
        Completion::Failed(err) => bail!("{} failed: {}", step, describe(&err)),
        Completion::Discarded => bail!("{} was cancelled", step),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let pose_style = PoseStyle::from_u8(args.pose_style)
        .with_context(|| format!("invalid --pose-style {} (expected 0, 1 or 2)", args.pose_style))?;
    let params = AnimationParams {
        pose_style,
        exp_scale: args.exp_scale,
        still: args.still,
        preprocess: args.preprocess,
    };

    let draft = AvatarDraft {
        name: args.name.clone(),
        skin_tone: args.skin_tone,
        hair_style: args.hair_style,
        clothing: args.clothing,
        personality: args.personality,
        background: args.background,
        language: args.language,
    };

    let backend = HttpBackend::new(&args.server);
    let mut driver = WizardDriver::new(backend).with_timeouts(
        Duration::from_secs(args.image_timeout),
        Duration::from_secs(args.video_timeout),
    );

    info!(server = %args.server, name = %args.name, "generating avatar");
    let completion = driver
        .run(Command::GenerateAvatar(draft))
        .await
        .context("could not start avatar generation")?;
    finish(completion, "avatar generation")?;

    let avatar = driver
        .wizard()
        .state()
        .avatar()
        .cloned()
        .context("wizard has no portrait after generation")?;
    println!("portrait: {}{}", args.server.trim_end_matches('/'), avatar.image_url);

    if args.image_only {
        return Ok(());
    }

    let audio = match (&args.audio, &args.text) {
        (Some(path), _) => {
            let data = tokio::fs::read(path)
                .await
                .with_context(|| format!("failed to read audio file {}", path.display()))?;
            let media_type = args
                .audio_type
                .clone()
                .unwrap_or_else(|| guess_audio_type(path).to_string());
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "audio".to_string());
            AudioClip::new(data, media_type, file_name)
        }
        (None, Some(text)) => {
            info!(voice = ?args.voice, "synthesizing speech");
            driver
                .backend()
                .synthesize_speech(text, args.voice.as_deref())
                .await
                .map_err(|e| anyhow::anyhow!("speech synthesis failed: {}", describe(&e)))?
        }
        (None, None) => bail!("either --audio or --text is required"),
    };

    info!(bytes = audio.data.len(), media_type = %audio.media_type, "generating talking video");
    let completion = driver
        .run(Command::GenerateVideo { audio, params })
        .await
        .context("could not start video generation")?;
    finish(completion, "video generation")?;

    let video = driver
        .wizard()
        .state()
        .video()
        .context("wizard has no video after generation")?;
    tokio::fs::write(&args.output, &video.data)
        .await
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    println!(
        "video: {} ({} bytes, {})",
        args.output.display(),
        video.data.len(),
        video.content_type
    );
    Ok(())
}
