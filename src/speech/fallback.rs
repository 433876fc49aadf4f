//! Host speech fallback when the remote pipeline fails

use std::process::{Command, Stdio};
use std::sync::Mutex;

use tts::Tts;

use crate::{Error, Result};

/// Last-resort, uncached speech
pub trait FallbackSpeaker: Send + Sync {
    /// Start speaking a phrase without waiting for it to finish
    ///
    /// # Errors
    ///
    /// Returns error if no host speech is available
    fn speak(&self, text: &str) -> Result<()>;
}

/// Speaks through the platform speech engine
///
/// Uses the `tts` crate (SAPI/WinRT, AVFoundation, Speech Dispatcher). If the
/// native engine cannot be opened, the listed speech commands are tried in
/// order instead.
pub struct SystemSpeaker {
    native: Option<Mutex<Option<Tts>>>,
    commands: Vec<&'static str>,
}

impl std::fmt::Debug for SystemSpeaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemSpeaker")
            .field("native", &self.native.is_some())
            .field("commands", &self.commands)
            .finish()
    }
}

impl Default for SystemSpeaker {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemSpeaker {
    /// Native engine first, then the platform's usual speech commands
    ///
    /// The native engine is opened on the first `speak`.
    #[must_use]
    pub fn new() -> Self {
        let commands = if cfg!(target_os = "macos") {
            vec!["say"]
        } else if cfg!(windows) {
            Vec::new()
        } else {
            vec!["spd-say", "espeak-ng", "espeak"]
        };
        Self {
            native: Some(Mutex::new(None)),
            commands,
        }
    }

    /// Skip the native engine and use only these commands, tried in order
    #[must_use]
    pub fn with_commands(commands: Vec<&'static str>) -> Self {
        Self {
            native: None,
            commands,
        }
    }

    fn speak_native(native: &Mutex<Option<Tts>>, text: &str) -> Result<()> {
        let mut guard = native
            .lock()
            .map_err(|e| Error::Fallback(format!("tts lock poisoned: {e}")))?;

        if guard.is_none() {
            let tts = Tts::default()
                .map_err(|e| Error::Fallback(format!("failed to initialize tts: {e}")))?;
            tracing::debug!("native tts initialized");
            *guard = Some(tts);
        }

        let Some(tts) = guard.as_mut() else {
            return Err(Error::Fallback("tts unavailable".to_string()));
        };

        tts.speak(text, false)
            .map_err(|e| Error::Fallback(format!("tts speak failed: {e}")))?;
        tracing::debug!(text, "speaking with native tts");
        Ok(())
    }

    fn speak_command(&self, text: &str) -> Result<()> {
        for program in &self.commands {
            let spawned = Command::new(program)
                .arg(text)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn();

            if let Ok(mut child) = spawned {
                tracing::debug!(program, text, "speaking with system tts command");
                // Reap in the background so callers never wait on speech
                std::thread::spawn(move || {
                    let _ = child.wait();
                });
                return Ok(());
            }
        }

        Err(Error::Fallback(format!(
            "no system TTS command found (tried {})",
            self.commands.join(", ")
        )))
    }
}

impl FallbackSpeaker for SystemSpeaker {
    fn speak(&self, text: &str) -> Result<()> {
        let native_err = match &self.native {
            Some(native) => match Self::speak_native(native, text) {
                Ok(()) => return Ok(()),
                Err(e) => Some(e),
            },
            None => None,
        };

        match (self.speak_command(text), native_err) {
            (Ok(()), _) => Ok(()),
            (Err(_), Some(native)) if self.commands.is_empty() => Err(native),
            (Err(e), Some(native)) => {
                tracing::debug!(error = %native, "native tts unavailable");
                Err(e)
            }
            (Err(e), None) => Err(e),
        }
    }
}

/// Fallback that stays silent
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSpeaker;

impl FallbackSpeaker for SilentSpeaker {
    fn speak(&self, text: &str) -> Result<()> {
        tracing::debug!(text, "fallback speech disabled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_commands_report_fallback_error() {
        let speaker = SystemSpeaker::with_commands(vec!["wordplay-no-such-tts-binary"]);
        let err = speaker.speak("hello").unwrap_err();

        assert!(matches!(err, Error::Fallback(_)));
        assert!(err.to_string().contains("wordplay-no-such-tts-binary"));
    }

    #[test]
    fn command_only_speaker_skips_native_engine() {
        let speaker = SystemSpeaker::with_commands(Vec::new());

        assert!(speaker.native.is_none());
        assert!(matches!(speaker.speak("hello"), Err(Error::Fallback(_))));
    }

    #[test]
    fn native_engine_opens_lazily() {
        let speaker = SystemSpeaker::new();
        let native = speaker.native.as_ref().unwrap();

        assert!(native.lock().unwrap().is_none());
    }

    #[test]
    fn silent_speaker_never_fails() {
        assert!(SilentSpeaker.speak("hello").is_ok());
    }
}
