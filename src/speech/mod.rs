//! Speech pipeline
//!
//! Synthesis, decoding, caching, playback, and host fallback for spoken
//! phrases. Game modes only need [`SpeechEngine`].

mod cache;
mod decode;
mod engine;
mod fallback;
mod playback;
mod synth;

pub use cache::{Phrase, SpeechCache};
pub use decode::{AudioBuffer, PcmFormat, decode, decode_pcm16};
pub use engine::{ENCOURAGEMENT_PHRASES, SpeakOutcome, SpeechEngine, encouragement};
pub use fallback::{FallbackSpeaker, SilentSpeaker, SystemSpeaker};
pub use playback::{
    AudioOutput, ContextState, CpalOutput, OutputFactory, PLAYBACK_SAMPLE_RATE, PlaybackEngine,
};
pub use synth::{
    Candidate, CandidateContent, GeminiSynthesizer, GenerateContentResponse, InlineData,
    ResponsePart, SpeechSynthesizer, extract_audio,
};
