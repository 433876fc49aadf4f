use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use wordplay::speech::{AudioBuffer, PLAYBACK_SAMPLE_RATE, PlaybackEngine};
use wordplay::{Config, SpeakOutcome, SpeechEngine, encouragement, phrases};

/// Extra time after a buffer's length before the process may exit
const PLAYBACK_TAIL: Duration = Duration::from_millis(300);

/// Wordplay - spoken vocabulary practice
#[derive(Parser)]
#[command(name = "wordplay", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Speak a phrase
    Speak {
        /// Text to speak
        text: String,
    },
    /// Fetch and cache each word and its reward phrase
    Warm {
        /// Words to warm
        #[arg(required = true)]
        words: Vec<String>,
    },
    /// Walk through words as flashcards
    Study {
        /// Words in deck order
        #[arg(required = true)]
        words: Vec<String>,
        /// Pause between cards in seconds
        #[arg(short, long, default_value = "2")]
        pause: u64,
    },
    /// Print a random encouragement
    Encourage {
        /// Also speak it
        #[arg(short, long)]
        speak: bool,
    },
    /// Test speaker output
    TestSpeaker,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn,wordplay=info",
        1 => "info,wordplay=debug",
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
    match cli.command {
        Command::Speak { text } => {
            let engine = load_engine()?;
            speak_and_wait(&engine, &text).await;
            Ok(())
        }
        Command::Warm { words } => warm(&words).await,
        Command::Study { words, pause } => study(&words, Duration::from_secs(pause)).await,
        Command::Encourage { speak } => {
            let message = encouragement();
            println!("{message}");
            if speak {
                let engine = load_engine()?;
                speak_and_wait(&engine, message).await;
            }
            Ok(())
        }
        Command::TestSpeaker => test_speaker().await,
    }
}

fn load_engine() -> anyhow::Result<SpeechEngine> {
    let config = Config::load();
    tracing::debug!(?config, "loaded configuration");
    Ok(SpeechEngine::from_config(config)?)
}

/// Speak and keep the process alive until the audio has played
async fn speak_and_wait(engine: &SpeechEngine, phrase: &str) {
    match engine.speak(phrase).await {
        SpeakOutcome::Played => {
            // Cache hit: the buffer was just stored by `speak`
            if let Some(buffer) = engine.cache().resolve(phrase).await {
                tokio::time::sleep(buffer.duration() + PLAYBACK_TAIL).await;
            }
        }
        SpeakOutcome::FellBack => {
            tracing::info!(phrase, "spoke with fallback voice");
        }
    }
}

/// Warm the cache for every word and its reward phrase
async fn warm(words: &[String]) -> anyhow::Result<()> {
    let engine = load_engine()?;
    let cache = engine.cache();

    let targets: Vec<String> = words
        .iter()
        .flat_map(|w| [w.clone(), phrases::correct(w)])
        .collect();

    let results = futures::future::join_all(targets.iter().map(|p| cache.resolve(p))).await;

    for (phrase, result) in targets.iter().zip(&results) {
        match result {
            Some(buffer) => println!("  ok    {phrase} ({:.2}s)", buffer.duration().as_secs_f32()),
            None => println!("  fail  {phrase}"),
        }
    }

    let cached = results.iter().filter(|r| r.is_some()).count();
    println!("---");
    println!("{cached}/{} phrases cached", targets.len());

    if cached == 0 {
        anyhow::bail!("no phrases could be synthesized");
    }
    Ok(())
}

/// Flashcard walk: keep neighbours warm while each card is spoken
async fn study(words: &[String], pause: Duration) -> anyhow::Result<()> {
    let engine = load_engine()?;

    for (index, word) in words.iter().enumerate() {
        engine.preload_study_window(words, index);
        println!("[{}/{}] {word}", index + 1, words.len());
        speak_and_wait(&engine, word).await;
        tokio::time::sleep(pause).await;
    }

    let message = encouragement();
    println!("{message}");
    speak_and_wait(&engine, message).await;
    Ok(())
}

/// Test speaker output
async fn test_speaker() -> anyhow::Result<()> {
    println!("Playing test tone (440 Hz, 1 second)...");

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..PLAYBACK_SAMPLE_RATE)
        .map(|i| {
            let t = i as f32 / PLAYBACK_SAMPLE_RATE as f32;
            0.3 * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
        })
        .collect();
    let buffer = Arc::new(AudioBuffer::from_mono(samples, PLAYBACK_SAMPLE_RATE));
    let duration = buffer.duration();

    PlaybackEngine::cpal().play(buffer).await?;
    tokio::time::sleep(duration + PLAYBACK_TAIL).await;

    println!("Done!");
    Ok(())
}
