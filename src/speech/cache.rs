//! Phrase audio cache with in-flight request deduplication
//!
//! A phrase is keyed by its exact text: no trimming or case folding, so
//! `"Pencil"` and `"pencil"` are fetched separately.
//!
//! Each phrase moves through at most three states: absent, pending (one
//! shared fetch all callers join), and resolved (decoded audio kept for the
//! life of the cache). A failed fetch returns the phrase to absent so the
//! next caller can retry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::sync::Mutex;

use super::decode::{self, AudioBuffer, PcmFormat};
use super::synth::SpeechSynthesizer;
use crate::{Error, Result};

/// Cache key: the literal phrase text
pub type Phrase = String;

/// Fetch that every concurrent caller for the same phrase awaits
type PendingFetch = Shared<BoxFuture<'static, Option<Arc<AudioBuffer>>>>;

#[derive(Default)]
struct CacheState {
    resolved: HashMap<Phrase, Arc<AudioBuffer>>,
    pending: HashMap<Phrase, PendingFetch>,
}

/// Resolves phrases to decoded audio, fetching each at most once at a time
///
/// Cloning is cheap and clones share the same cache.
#[derive(Clone)]
pub struct SpeechCache {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    format: PcmFormat,
    fetch_timeout: Duration,
    state: Arc<Mutex<CacheState>>,
}

impl SpeechCache {
    /// Create an empty cache backed by a synthesizer
    #[must_use]
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        format: PcmFormat,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            synthesizer,
            format,
            fetch_timeout,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    /// Resolve a phrase to decoded audio
    ///
    /// Returns cached audio without I/O, joins an in-flight fetch for the same
    /// phrase, or starts a new one. Failures are logged and surface as `None`.
    pub async fn resolve(&self, phrase: &str) -> Option<Arc<AudioBuffer>> {
        let fetch = {
            let mut state = self.state.lock().await;

            if let Some(buffer) = state.resolved.get(phrase) {
                tracing::trace!(phrase, "speech cache hit");
                return Some(Arc::clone(buffer));
            }

            if let Some(pending) = state.pending.get(phrase) {
                tracing::trace!(phrase, "joining in-flight speech fetch");
                pending.clone()
            } else {
                tracing::debug!(phrase, "starting speech fetch");
                let pending = self.start_fetch(phrase.to_string());
                state.pending.insert(phrase.to_string(), pending.clone());
                pending
            }
        };

        fetch.await
    }

    /// Whether decoded audio is already stored for a phrase
    pub async fn is_cached(&self, phrase: &str) -> bool {
        self.state.lock().await.resolved.contains_key(phrase)
    }

    /// Whether a fetch for a phrase is currently in flight
    pub async fn is_pending(&self, phrase: &str) -> bool {
        self.state.lock().await.pending.contains_key(phrase)
    }

    /// Number of phrases with decoded audio
    pub async fn cached_count(&self) -> usize {
        self.state.lock().await.resolved.len()
    }

    /// Number of fetches in flight
    pub async fn pending_count(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    /// Spawn the fetch for a phrase and wrap it for sharing
    ///
    /// Must be called with the state lock held: the spawned task needs the
    /// same lock to settle, so it cannot clear the pending entry before the
    /// caller has inserted it.
    fn start_fetch(&self, phrase: Phrase) -> PendingFetch {
        let synthesizer = Arc::clone(&self.synthesizer);
        let state = Arc::clone(&self.state);
        let format = self.format;
        let fetch_timeout = self.fetch_timeout;
        let task_phrase = phrase.clone();

        let task = tokio::spawn(async move {
            let outcome = fetch_audio(synthesizer.as_ref(), &task_phrase, format, fetch_timeout).await;

            let mut state = state.lock().await;
            state.pending.remove(&task_phrase);

            match outcome {
                Ok(buffer) => {
                    let buffer = Arc::new(buffer);
                    tracing::debug!(
                        phrase = %task_phrase,
                        frames = buffer.frames(),
                        "cached speech audio"
                    );
                    state.resolved.insert(task_phrase, Arc::clone(&buffer));
                    Some(buffer)
                }
                Err(e) => {
                    tracing::warn!(phrase = %task_phrase, error = %e, "speech fetch failed");
                    None
                }
            }
        });

        let state = Arc::clone(&self.state);
        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(phrase = %phrase, error = %e, "speech fetch task aborted");
                    state.lock().await.pending.remove(&phrase);
                    None
                }
            }
        }
        .boxed()
        .shared()
    }
}

/// One bounded synthesis attempt followed by decoding
async fn fetch_audio(
    synthesizer: &dyn SpeechSynthesizer,
    phrase: &str,
    format: PcmFormat,
    fetch_timeout: Duration,
) -> Result<AudioBuffer> {
    let payload = tokio::time::timeout(fetch_timeout, synthesizer.synthesize(phrase))
        .await
        .map_err(|_| Error::Timeout(fetch_timeout))??;

    decode::decode(&payload, format)
}
