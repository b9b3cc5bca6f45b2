use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

use reverie::voice::{
    AudioSink, CpalSink, GeminiSpeech, SpeechSynthesizer, TTS_SAMPLE_RATE,
};
use reverie::{Config, GeminiReflection, ReflectionSource, Session, Speaker, Voice};

/// Reverie - spoken metaphorical reflections
#[derive(Parser)]
#[command(name = "reverie", version, about)]
struct Cli {
    /// Voice for synthesized speech (e.g. "Kore")
    #[arg(long, env = "REVERIE_VOICE")]
    voice: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a single reflection and print it
    Reflect {
        /// What's on your mind
        text: String,
    },
    /// Synthesize text and play it (or save it to a WAV file)
    Speak {
        /// Text to speak
        text: String,

        /// Write a WAV file instead of playing
        #[arg(short, long)]
        out: Option<std::path::PathBuf>,
    },
    /// List available voices
    Voices,
    /// Test speaker output
    TestSpeaker,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,reverie=info",
        1 => "info,reverie=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let voice_ref = cli.voice.as_deref();

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Reflect { text } => cmd_reflect(voice_ref, &text).await,
            Command::Speak { text, out } => cmd_speak(voice_ref, &text, out.as_deref()).await,
            Command::Voices => cmd_voices(voice_ref),
            Command::TestSpeaker => cmd_test_speaker(),
        };
    }

    let config = Config::load(voice_ref)?;
    tracing::debug!(voice = %config.voice, model = %config.text_model, "starting session");

    let reflections: Arc<dyn ReflectionSource> = Arc::new(GeminiReflection::new(
        SecretString::from(config.api_key.clone()),
        config.text_model.clone(),
    )?);
    let synthesizer: Arc<dyn SpeechSynthesizer> = Arc::new(GeminiSpeech::new(
        SecretString::from(config.api_key.clone()),
        config.tts_model.clone(),
    )?);
    let sink: Arc<dyn AudioSink> = Arc::new(CpalSink::new()?);

    let speaker = Speaker::new(synthesizer, sink);
    let mut session = Session::new(reflections, speaker, config.voice);

    session.run().await?;
    Ok(())
}

/// Generate one reflection and print it
async fn cmd_reflect(voice: Option<&str>, text: &str) -> anyhow::Result<()> {
    let text = text.trim();
    anyhow::ensure!(!text.is_empty(), "nothing to reflect on");

    let config = Config::load(voice)?;
    let reflections =
        GeminiReflection::new(SecretString::from(config.api_key), config.text_model)?;

    let reflection = reflections.reflect(text).await?;
    println!("{reflection}");

    Ok(())
}

/// Synthesize text and play it, or write it to a WAV file
async fn cmd_speak(
    voice: Option<&str>,
    text: &str,
    out: Option<&std::path::Path>,
) -> anyhow::Result<()> {
    let text = text.trim();
    anyhow::ensure!(!text.is_empty(), "nothing to speak");

    let config = Config::load(voice)?;
    let synthesizer: Arc<dyn SpeechSynthesizer> = Arc::new(GeminiSpeech::new(
        SecretString::from(config.api_key),
        config.tts_model,
    )?);

    if let Some(path) = out {
        let payload = synthesizer.synthesize(text, config.voice).await?;
        let frames = reverie::voice::pcm::decode_payload(&payload)?;
        let wav = reverie::voice::samples_to_wav(&frames, TTS_SAMPLE_RATE)?;
        std::fs::write(path, wav)?;
        println!("Wrote {} ({} samples)", path.display(), frames.len());
        return Ok(());
    }

    let sink: Arc<dyn AudioSink> = Arc::new(CpalSink::new()?);
    let speaker = Speaker::new(synthesizer, sink);

    println!("Synthesizing with voice {}...", config.voice);
    speaker.play(text, config.voice).await?;

    while speaker.is_speaking() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    Ok(())
}

/// List the voice set, marking the configured default
fn cmd_voices(voice: Option<&str>) -> anyhow::Result<()> {
    let selected = match voice {
        Some(name) => name.parse::<Voice>()?,
        None => Voice::default(),
    };

    for v in Voice::ALL {
        let marker = if v == selected { "*" } else { " " };
        println!("{marker} {v}");
    }

    Ok(())
}

/// Test speaker output with a sine wave
fn cmd_test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let sink = CpalSink::new()?;

    // Generate 2 seconds of 440Hz sine wave at the playback sample rate
    let frequency = 440.0_f32;
    let duration_secs = 2.0_f32;
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let num_samples = (TTS_SAMPLE_RATE as f32 * duration_secs) as usize;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / TTS_SAMPLE_RATE as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3 // 30% volume
        })
        .collect();

    println!("Playing {num_samples} samples at {TTS_SAMPLE_RATE} Hz...");

    let mut handle = sink.start(samples)?;
    while !handle.is_finished() {
        std::thread::sleep(Duration::from_millis(50));
    }
    handle.stop();

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");

    Ok(())
}
