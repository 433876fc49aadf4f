//! TOML configuration file loading
//!
//! Supports `~/.config/wordplay/config.toml` as a persistent config source.
//! All fields are optional — the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct WordplayConfigFile {
    /// Speech synthesis configuration
    #[serde(default)]
    pub speech: SpeechFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Speech synthesis and playback configuration
#[derive(Debug, Default, Deserialize)]
pub struct SpeechFileConfig {
    /// TTS model (e.g. "gemini-2.5-flash-preview-tts")
    pub model: Option<String>,

    /// Prebuilt voice name (e.g. "Kore")
    pub voice: Option<String>,

    /// Provider API base URL
    pub api_base_url: Option<String>,

    /// Instruction prepended to every phrase
    pub prompt_prefix: Option<String>,

    /// Upper bound on a single synthesis attempt, in seconds
    pub fetch_timeout_secs: Option<u64>,

    /// Decoded PCM sample rate
    pub sample_rate: Option<u32>,

    /// Decoded PCM channel count
    pub channels: Option<u16>,

    /// Use host speech when the remote pipeline fails
    pub fallback_enabled: Option<bool>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    /// Gemini API key
    pub gemini: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `WordplayConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> WordplayConfigFile {
    let Some(path) = config_file_path() else {
        return WordplayConfigFile::default();
    };

    load_config_file_from(&path)
}

/// Load a TOML config file from an explicit path
///
/// Missing or unparseable files fall back to defaults.
pub fn load_config_file_from(path: &Path) -> WordplayConfigFile {
    if !path.exists() {
        return WordplayConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                WordplayConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            WordplayConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/wordplay/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("wordplay").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_file() {
        let file: WordplayConfigFile = toml::from_str(
            r#"
            [speech]
            voice = "Puck"
            fetch_timeout_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(file.speech.voice.as_deref(), Some("Puck"));
        assert_eq!(file.speech.fetch_timeout_secs, Some(5));
        assert!(file.speech.model.is_none());
        assert!(file.api_keys.gemini.is_none());
    }

    #[test]
    fn empty_file_is_default() {
        let file: WordplayConfigFile = toml::from_str("").unwrap();
        assert!(file.speech.voice.is_none());
        assert!(file.speech.fallback_enabled.is_none());
    }

    #[test]
    fn missing_file_is_default() {
        let file = load_config_file_from(Path::new("/nonexistent/wordplay/config.toml"));
        assert!(file.api_keys.gemini.is_none());
    }
}
