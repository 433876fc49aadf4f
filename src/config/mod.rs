//! Configuration management for the wordplay speech engine

pub mod file;

use std::time::Duration;

use secrecy::SecretString;

use self::file::WordplayConfigFile;

/// Default TTS model
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-tts";

/// Default prebuilt voice
pub const DEFAULT_VOICE: &str = "Kore";

/// Default provider API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default instruction prepended to each phrase
pub const DEFAULT_PROMPT_PREFIX: &str = "Say clearly:";

/// Default bound on a single synthesis attempt
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Provider PCM sample rate (24kHz)
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

/// Provider PCM channel count (mono)
pub const DEFAULT_CHANNELS: u16 = 1;

/// Wordplay configuration
#[derive(Debug)]
pub struct Config {
    /// Speech synthesis configuration
    pub speech: SpeechConfig,

    /// Provider credential, read from `GEMINI_API_KEY` or `API_KEY`
    pub api_key: Option<SecretString>,
}

/// Speech synthesis and playback configuration
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// TTS model identifier
    pub model: String,

    /// Prebuilt voice name
    pub voice: String,

    /// Provider API base URL
    pub api_base_url: String,

    /// Instruction prepended to every phrase
    pub prompt_prefix: String,

    /// Upper bound on a single synthesis attempt
    pub fetch_timeout: Duration,

    /// Decoded PCM sample rate
    pub sample_rate: u32,

    /// Decoded PCM channel count
    pub channels: u16,

    /// Use host speech when the remote pipeline fails
    pub fallback_enabled: bool,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            voice: DEFAULT_VOICE.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            prompt_prefix: DEFAULT_PROMPT_PREFIX.to_string(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            fallback_enabled: true,
        }
    }
}

impl Config {
    /// Load configuration from the config file and the process environment
    ///
    /// A missing credential is not an error here; every remote fetch fails
    /// instead and the engine degrades to fallback speech.
    #[must_use]
    pub fn load() -> Self {
        let file = file::load_config_file();
        Self::from_sources(file, |name| std::env::var(name).ok())
    }

    /// Build configuration from a parsed file overlay and an environment lookup
    ///
    /// Priority: environment → config file → defaults
    #[must_use]
    pub fn from_sources(file: WordplayConfigFile, env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = SpeechConfig::default();
        let speech_file = file.speech;

        let fetch_timeout = env("WORDPLAY_FETCH_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .or(speech_file.fetch_timeout_secs)
            .map_or(defaults.fetch_timeout, Duration::from_secs);

        let speech = SpeechConfig {
            model: env("WORDPLAY_TTS_MODEL")
                .or(speech_file.model)
                .unwrap_or(defaults.model),
            voice: env("WORDPLAY_TTS_VOICE")
                .or(speech_file.voice)
                .unwrap_or(defaults.voice),
            api_base_url: env("WORDPLAY_API_BASE_URL")
                .or(speech_file.api_base_url)
                .unwrap_or(defaults.api_base_url),
            prompt_prefix: speech_file.prompt_prefix.unwrap_or(defaults.prompt_prefix),
            fetch_timeout,
            sample_rate: speech_file.sample_rate.unwrap_or(defaults.sample_rate),
            channels: speech_file.channels.unwrap_or(defaults.channels),
            fallback_enabled: env("WORDPLAY_DISABLE_FALLBACK")
                .map(|v| !is_truthy(&v))
                .or(speech_file.fallback_enabled)
                .unwrap_or(defaults.fallback_enabled),
        };

        let api_key = env("GEMINI_API_KEY")
            .or_else(|| env("API_KEY"))
            .or(file.api_keys.gemini)
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::from);

        if api_key.is_none() {
            tracing::warn!("no TTS API key configured (set GEMINI_API_KEY), speech will use fallback");
        }

        Self { speech, api_key }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
