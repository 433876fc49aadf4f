//! Shared test doubles for the speech pipeline

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};

use wordplay::speech::{
    AudioBuffer, AudioOutput, ContextState, FallbackSpeaker, PcmFormat, PlaybackEngine,
    SpeechCache, SpeechSynthesizer,
};
use wordplay::{Error, Result, SpeechEngine};

/// Base64 of little-endian PCM16 samples
#[must_use]
pub fn encode_pcm(samples: &[i16]) -> String {
    let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    general_purpose::STANDARD.encode(bytes)
}

/// How the fake provider answers
#[derive(Clone)]
pub enum Reply {
    /// Valid audio after a delay
    Audio(Duration),
    /// Provider error after a delay
    Fail(Duration),
    /// Success with an unusable payload
    Malformed,
    /// Never answers
    Hang,
}

/// Fake provider that counts calls per phrase
pub struct FakeSynth {
    reply: Reply,
    calls: AtomicUsize,
    phrases: Mutex<Vec<String>>,
}

impl FakeSynth {
    pub fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            phrases: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn phrases(&self) -> Vec<String> {
        self.phrases.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynth {
    async fn synthesize(&self, phrase: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.phrases.lock().unwrap().push(phrase.to_string());

        match &self.reply {
            Reply::Audio(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(encode_pcm(&[0, 16384, -16384, 0]))
            }
            Reply::Fail(delay) => {
                tokio::time::sleep(*delay).await;
                Err(Error::Provider("503 unavailable".to_string()))
            }
            Reply::Malformed => Ok("AAA".to_string()),
            Reply::Hang => std::future::pending().await,
        }
    }
}

/// Fake output that records every call
pub struct FakeOutput {
    state: Mutex<ContextState>,
    fail_start: bool,
    resumes: AtomicUsize,
    starts: AtomicUsize,
}

impl FakeOutput {
    pub fn running() -> Arc<Self> {
        Self::build(ContextState::Running, false)
    }

    pub fn suspended() -> Arc<Self> {
        Self::build(ContextState::Suspended, false)
    }

    pub fn broken() -> Arc<Self> {
        Self::build(ContextState::Running, true)
    }

    fn build(state: ContextState, fail_start: bool) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(state),
            fail_start,
            resumes: AtomicUsize::new(0),
            starts: AtomicUsize::new(0),
        })
    }

    pub fn resumes(&self) -> usize {
        self.resumes.load(Ordering::SeqCst)
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioOutput for FakeOutput {
    fn state(&self) -> ContextState {
        *self.state.lock().unwrap()
    }

    async fn resume(&self) -> Result<()> {
        self.resumes.fetch_add(1, Ordering::SeqCst);
        *self.state.lock().unwrap() = ContextState::Running;
        Ok(())
    }

    async fn start(&self, _buffer: Arc<AudioBuffer>, _gain: f32) -> Result<()> {
        if self.fail_start {
            return Err(Error::Playback("device disconnected".to_string()));
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Playback engine over a fake output, counting factory calls
pub fn playback_with(output: Arc<FakeOutput>, builds: Arc<AtomicUsize>) -> PlaybackEngine {
    PlaybackEngine::new(Box::new(move || -> Result<Arc<dyn AudioOutput>> {
        builds.fetch_add(1, Ordering::SeqCst);
        Ok(output.clone())
    }))
}

/// Playback engine whose output can never be built
pub fn unavailable_playback() -> PlaybackEngine {
    PlaybackEngine::new(Box::new(|| -> Result<Arc<dyn AudioOutput>> {
        Err(Error::Playback("no output device available".to_string()))
    }))
}

/// Fallback that remembers what it was asked to say
#[derive(Default)]
pub struct FakeFallback {
    spoken: Mutex<Vec<String>>,
    fail: bool,
}

impl FakeFallback {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            spoken: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

impl FallbackSpeaker for FakeFallback {
    fn speak(&self, text: &str) -> Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(Error::Fallback("no system TTS".to_string()));
        }
        Ok(())
    }
}

/// Cache over a fake provider with a generous timeout
pub fn cache_with(synth: Arc<FakeSynth>) -> SpeechCache {
    SpeechCache::new(synth, PcmFormat::PROVIDER, Duration::from_secs(5))
}

/// Everything a scenario test needs to inspect
pub struct Harness {
    pub engine: SpeechEngine,
    pub synth: Arc<FakeSynth>,
    pub output: Arc<FakeOutput>,
    pub fallback: Arc<FakeFallback>,
    pub builds: Arc<AtomicUsize>,
}

impl Harness {
    pub fn new(reply: Reply) -> Self {
        Self::with_output(reply, FakeOutput::running())
    }

    pub fn with_output(reply: Reply, output: Arc<FakeOutput>) -> Self {
        let synth = FakeSynth::new(reply);
        let fallback = FakeFallback::new();
        let builds = Arc::new(AtomicUsize::new(0));

        let engine = SpeechEngine::new(
            cache_with(Arc::clone(&synth)),
            playback_with(Arc::clone(&output), Arc::clone(&builds)),
            Arc::clone(&fallback) as Arc<dyn FallbackSpeaker>,
        );

        Self {
            engine,
            synth,
            output,
            fallback,
            builds,
        }
    }

    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

/// Let detached tasks make progress
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
