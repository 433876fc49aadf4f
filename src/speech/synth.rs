//! Text-to-speech (TTS) synthesis client

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::SpeechConfig;
use crate::{Error, Result};

/// Produces an encoded audio payload for a phrase
///
/// The payload is base64 of raw little-endian 16-bit PCM.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize a single phrase
    ///
    /// # Errors
    ///
    /// Returns error if the provider fails or returns no audio
    async fn synthesize(&self, phrase: &str) -> Result<String>;
}

/// Synthesizes speech with the Gemini `generateContent` TTS endpoint
pub struct GeminiSynthesizer {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    endpoint: String,
    voice: String,
    prompt_prefix: String,
}

impl GeminiSynthesizer {
    /// Create a new synthesizer
    ///
    /// A missing API key is accepted; every `synthesize` call then fails with
    /// a configuration error so callers degrade instead of crashing.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(api_key: Option<SecretString>, config: &SpeechConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!(
                "{}/models/{}:generateContent",
                config.api_base_url.trim_end_matches('/'),
                config.model
            ),
            voice: config.voice.clone(),
            prompt_prefix: config.prompt_prefix.clone(),
        })
    }

    /// Endpoint this synthesizer posts to
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SpeechSynthesizer for GeminiSynthesizer {
    async fn synthesize(&self, phrase: &str) -> Result<String> {
        let Some(api_key) = &self.api_key else {
            return Err(Error::Config("TTS API key missing".to_string()));
        };

        let request = build_request(&self.prompt_prefix, phrase, &self.voice);

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!("TTS error {status}: {body}")));
        }

        let body: GenerateContentResponse = response.json().await?;
        extract_audio(body)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
    speech_config: SpeechSettings,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechSettings {
    voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

/// Build a single-shot, audio-only request for one phrase
pub(crate) fn build_request(prefix: &str, phrase: &str, voice: &str) -> GenerateContentRequest {
    let text = if prefix.is_empty() {
        phrase.to_string()
    } else {
        format!("{prefix} {phrase}")
    };

    GenerateContentRequest {
        contents: vec![RequestContent {
            parts: vec![TextPart { text }],
        }],
        generation_config: GenerationConfig {
            response_modalities: vec!["AUDIO"],
            speech_config: SpeechSettings {
                voice_config: VoiceConfig {
                    prebuilt_voice_config: PrebuiltVoiceConfig {
                        voice_name: voice.to_string(),
                    },
                },
            },
        },
    }
}

/// Response from the `generateContent` endpoint
///
/// Every level is optional on the wire; `extract_audio` validates the path.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: Option<String>,
    pub data: Option<String>,
}

/// Pull the first inline audio payload out of a response
///
/// # Errors
///
/// Returns `MalformedResponse` when any step of the path is missing or the
/// payload is empty
pub fn extract_audio(response: GenerateContentResponse) -> Result<String> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| Error::MalformedResponse("no candidates in response".to_string()))?;

    let content = candidate
        .content
        .ok_or_else(|| Error::MalformedResponse("candidate has no content".to_string()))?;

    let data = content
        .parts
        .into_iter()
        .find_map(|part| part.inline_data)
        .and_then(|inline| inline.data)
        .ok_or_else(|| Error::MalformedResponse("no inline audio data".to_string()))?;

    if data.is_empty() {
        return Err(Error::MalformedResponse("inline audio data is empty".to_string()));
    }

    Ok(data)
}
