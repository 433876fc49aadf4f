//! Public speech surface used by the game modes
//!
//! `preload` warms the cache without waiting, `speak` plays a phrase and
//! falls back to host speech on any failure. Neither ever surfaces an error.

use std::sync::Arc;

use rand::seq::SliceRandom;

use super::cache::SpeechCache;
use super::decode::PcmFormat;
use super::fallback::{FallbackSpeaker, SilentSpeaker, SystemSpeaker};
use super::playback::PlaybackEngine;
use super::synth::{GeminiSynthesizer, SpeechSynthesizer};
use crate::config::Config;
use crate::phrases;
use crate::{Error, Result};

/// Praise spoken or shown after a correct answer
pub const ENCOURAGEMENT_PHRASES: [&str; 8] = [
    "Awesome Job!",
    "Super Star!",
    "You're Amazing!",
    "Fantastic!",
    "Keep it up!",
    "Brilliant!",
    "Good Job!",
    "Way to go!",
];

/// Pick an encouragement uniformly at random
#[must_use]
pub fn encouragement() -> &'static str {
    ENCOURAGEMENT_PHRASES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(ENCOURAGEMENT_PHRASES[0])
}

/// How a `speak` call was voiced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakOutcome {
    /// Remote audio played through the output
    Played,
    /// Remote pipeline failed; host speech was used
    FellBack,
}

/// Cached, deduplicated speech with lazy playback and a host fallback
pub struct SpeechEngine {
    cache: SpeechCache,
    playback: PlaybackEngine,
    fallback: Arc<dyn FallbackSpeaker>,
}

impl SpeechEngine {
    /// Assemble an engine from its parts
    #[must_use]
    pub fn new(
        cache: SpeechCache,
        playback: PlaybackEngine,
        fallback: Arc<dyn FallbackSpeaker>,
    ) -> Self {
        Self {
            cache,
            playback,
            fallback,
        }
    }

    /// Build the default engine: Gemini synthesis, cpal output, system fallback
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn from_config(config: Config) -> Result<Self> {
        let speech = config.speech;
        let synthesizer: Arc<dyn SpeechSynthesizer> =
            Arc::new(GeminiSynthesizer::new(config.api_key, &speech)?);

        let format = PcmFormat {
            sample_rate: speech.sample_rate,
            channels: speech.channels,
        };
        let cache = SpeechCache::new(synthesizer, format, speech.fetch_timeout);

        let fallback: Arc<dyn FallbackSpeaker> = if speech.fallback_enabled {
            Arc::new(SystemSpeaker::new())
        } else {
            Arc::new(SilentSpeaker)
        };

        Ok(Self::new(cache, PlaybackEngine::cpal(), fallback))
    }

    /// The underlying phrase cache
    #[must_use]
    pub const fn cache(&self) -> &SpeechCache {
        &self.cache
    }

    /// Warm the cache for a phrase without waiting
    ///
    /// Runs as a detached task; failures are logged and dropped.
    pub fn preload(&self, phrase: &str) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(phrase, "preload outside of a tokio runtime ignored");
            return;
        };

        let cache = self.cache.clone();
        let phrase = phrase.to_string();
        runtime.spawn(async move {
            if cache.resolve(&phrase).await.is_none() {
                tracing::debug!(phrase = %phrase, "preload ignored");
            }
        });
    }

    /// Preload a round's target word and its reward phrase
    pub fn preload_round(&self, word: &str) {
        self.preload(word);
        self.preload(&phrases::correct(word));
    }

    /// Preload the flashcard at `index` and its neighbours
    pub fn preload_study_window<S: AsRef<str>>(&self, words: &[S], index: usize) {
        if words.is_empty() {
            return;
        }
        for i in phrases::study_window(words.len(), index) {
            self.preload(words[i].as_ref());
        }
    }

    /// Speak a phrase, falling back to host speech on any failure
    ///
    /// Always completes; a failing fallback is logged and not escalated.
    pub async fn speak(&self, phrase: &str) -> SpeakOutcome {
        match self.speak_remote(phrase).await {
            Ok(()) => SpeakOutcome::Played,
            Err(e) => {
                tracing::warn!(phrase, error = %e, "speech failed, using fallback");
                if let Err(e) = self.fallback.speak(phrase) {
                    tracing::warn!(phrase, error = %e, "fallback speech failed");
                }
                SpeakOutcome::FellBack
            }
        }
    }

    async fn speak_remote(&self, phrase: &str) -> Result<()> {
        let buffer = self
            .cache
            .resolve(phrase)
            .await
            .ok_or_else(|| Error::Provider(format!("no audio for {phrase:?}")))?;

        self.playback.play(buffer).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn encouragement_is_from_fixed_set() {
        for _ in 0..200 {
            assert!(ENCOURAGEMENT_PHRASES.contains(&encouragement()));
        }
    }

    #[test]
    fn every_encouragement_is_reachable() {
        let seen: HashSet<&str> = (0..2_000).map(|_| encouragement()).collect();
        assert_eq!(seen.len(), ENCOURAGEMENT_PHRASES.len());
    }
}
