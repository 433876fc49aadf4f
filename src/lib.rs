//! Wordplay - speech engine for a children's vocabulary game
//!
//! The game modes (listening quiz, spelling, flashcards) call two operations:
//! warm the cache for a phrase, and speak a phrase now. This crate provides
//! the engine behind them:
//! - Remote TTS synthesis with a bounded timeout
//! - Base64 PCM decoding into playable buffers
//! - A session cache that fetches each phrase at most once at a time
//! - Lazy audio output and a host speech fallback
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │          Game modes: Listen │ Spell │ Study          │
//! └──────────────┬───────────────────────┬──────────────┘
//!           preload()                speak()
//! ┌──────────────▼───────────────────────▼──────────────┐
//! │                   SpeechEngine                       │
//! │   SpeechCache (resolved + pending)  │  Fallback      │
//! └──────────────┬───────────────────────┬──────────────┘
//!                │                       │
//! ┌──────────────▼──────────┐ ┌──────────▼──────────────┐
//! │ Synthesizer → decode    │ │ PlaybackEngine (cpal)   │
//! └─────────────────────────┘ └─────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod phrases;
pub mod speech;

pub use config::{Config, SpeechConfig};
pub use error::{Error, Result};
pub use speech::{SpeakOutcome, SpeechCache, SpeechEngine, encouragement};
