//! Audio playback to speakers

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};
use tokio::sync::{OnceCell, oneshot};

use super::decode::AudioBuffer;
use crate::{Error, Result};

/// Sample rate for playback (matches provider TTS output, so no resampling)
pub const PLAYBACK_SAMPLE_RATE: u32 = 24_000;

/// Gain applied between the buffer source and the output
const OUTPUT_GAIN: f32 = 1.0;

/// Whether an output context will currently produce sound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Output is live
    Running,
    /// Output is gated until resumed
    Suspended,
}

/// Process-wide audio output handle
#[async_trait]
pub trait AudioOutput: Send + Sync {
    /// Current gating state
    fn state(&self) -> ContextState;

    /// Lift a suspended state
    ///
    /// # Errors
    ///
    /// Returns error if the output cannot be resumed
    async fn resume(&self) -> Result<()>;

    /// Start playing a buffer through a gain stage
    ///
    /// Returns once playback has started, not when it ends. Overlapping calls
    /// play over each other.
    ///
    /// # Errors
    ///
    /// Returns error if the output stream cannot be built or started
    async fn start(&self, buffer: Arc<AudioBuffer>, gain: f32) -> Result<()>;
}

/// Builds the output on first use
pub type OutputFactory = Box<dyn Fn() -> Result<Arc<dyn AudioOutput>> + Send + Sync>;

/// Lazily creates the output context and plays decoded buffers through it
pub struct PlaybackEngine {
    factory: OutputFactory,
    output: OnceCell<Arc<dyn AudioOutput>>,
}

impl PlaybackEngine {
    /// Create a playback engine whose output is built on the first `play`
    #[must_use]
    pub fn new(factory: OutputFactory) -> Self {
        Self {
            factory,
            output: OnceCell::new(),
        }
    }

    /// Create a playback engine on the default cpal output device
    #[must_use]
    pub fn cpal() -> Self {
        Self::new(Box::new(|| -> Result<Arc<dyn AudioOutput>> {
            Ok(Arc::new(CpalOutput::new()?))
        }))
    }

    /// Whether the output context has been created yet
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.output.initialized()
    }

    /// Play a buffer once
    ///
    /// A failed construction is not cached; the next call tries again.
    ///
    /// # Errors
    ///
    /// Returns `Playback` if the output cannot be built, resumed, or started
    pub async fn play(&self, buffer: Arc<AudioBuffer>) -> Result<()> {
        let output = self
            .output
            .get_or_try_init(|| async { (self.factory)() })
            .await?;

        if output.state() == ContextState::Suspended {
            tracing::debug!("resuming suspended audio output");
            output.resume().await?;
        }

        output.start(buffer, OUTPUT_GAIN).await
    }
}

/// Output on the host's default device via cpal
///
/// Native hosts have no autoplay gate, so this output is always running.
pub struct CpalOutput {
    config: StreamConfig,
}

impl CpalOutput {
    /// Open the default output device at the playback sample rate
    ///
    /// # Errors
    ///
    /// Returns error if no output device or suitable config is available
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Playback("no output device available".to_string()))?;

        let supported_config = device
            .supported_output_configs()
            .map_err(|e| Error::Playback(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
            })
            .or_else(|| {
                // Fallback: try stereo
                device.supported_output_configs().ok()?.find(|c| {
                    c.channels() == 2
                        && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                        && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
                })
            })
            .ok_or_else(|| Error::Playback("no suitable output config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(PLAYBACK_SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = PLAYBACK_SAMPLE_RATE,
            channels = config.channels,
            "audio output initialized"
        );

        Ok(Self { config })
    }
}

#[async_trait]
impl AudioOutput for CpalOutput {
    fn state(&self) -> ContextState {
        ContextState::Running
    }

    async fn resume(&self) -> Result<()> {
        Ok(())
    }

    async fn start(&self, buffer: Arc<AudioBuffer>, gain: f32) -> Result<()> {
        if buffer.sample_rate() != PLAYBACK_SAMPLE_RATE {
            tracing::warn!(
                buffer_rate = buffer.sample_rate(),
                output_rate = PLAYBACK_SAMPLE_RATE,
                "buffer sample rate differs from output, pitch will shift"
            );
        }

        let samples: Vec<f32> = buffer.to_mono().into_iter().map(|s| s * gain).collect();
        if samples.is_empty() {
            return Ok(());
        }

        let config = self.config.clone();
        let (started_tx, started_rx) = oneshot::channel();

        // cpal streams are not Send on every host, so each voice owns a thread
        std::thread::Builder::new()
            .name("wordplay-voice".to_string())
            .spawn(move || play_samples_blocking(&config, samples, started_tx))
            .map_err(|e| Error::Playback(format!("failed to spawn playback thread: {e}")))?;

        started_rx
            .await
            .map_err(|_| Error::Playback("playback thread exited before starting".to_string()))?
    }
}

/// Play samples on the default device, blocking until they finish
///
/// Reports on `started` once the stream is running or failed to start.
fn play_samples_blocking(
    config: &StreamConfig,
    samples: Vec<f32>,
    started: oneshot::Sender<Result<()>>,
) {
    let sample_count = samples.len();
    let stream = match build_stream(config, samples) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = started.send(Err(e));
            return;
        }
    };
    let _ = started.send(Ok(()));

    let duration_ms = (sample_count as u64 * 1000) / u64::from(config.sample_rate.0);

    // Poll for completion with timeout
    let start = Instant::now();
    let timeout = Duration::from_millis(duration_ms + 500);

    while !stream.finished.load(Ordering::SeqCst) {
        if start.elapsed() > timeout {
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    // Small delay to ensure audio finishes
    std::thread::sleep(Duration::from_millis(100));

    drop(stream);
    tracing::debug!(samples = sample_count, "playback complete");
}

struct RunningStream {
    _stream: cpal::Stream,
    finished: Arc<AtomicBool>,
}

fn build_stream(config: &StreamConfig, samples: Vec<f32>) -> Result<RunningStream> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| Error::Playback("no output device".to_string()))?;

    let channels = usize::from(config.channels);
    let finished = Arc::new(AtomicBool::new(false));
    let finished_clone = Arc::clone(&finished);
    let mut position = 0usize;

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    let sample = samples.get(position).copied().unwrap_or_else(|| {
                        finished_clone.store(true, Ordering::SeqCst);
                        0.0
                    });

                    for out in frame.iter_mut() {
                        *out = sample;
                    }

                    if position < samples.len() {
                        position += 1;
                    }
                }
            },
            |err| {
                tracing::error!(error = %err, "audio stream error");
            },
            None,
        )
        .map_err(|e| Error::Playback(e.to_string()))?;

    stream.play().map_err(|e| Error::Playback(e.to_string()))?;

    Ok(RunningStream {
        _stream: stream,
        finished,
    })
}
