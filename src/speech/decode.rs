//! Decoding of provider PCM payloads into playable buffers

use std::time::Duration;

use base64::{Engine as _, engine::general_purpose};

use crate::{Error, Result};

/// Scale factor mapping a signed 16-bit sample onto `[-1.0, 1.0]`
const PCM16_SCALE: f32 = 32768.0;

/// Shape of the raw PCM delivered by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    /// Samples per second per channel
    pub sample_rate: u32,
    /// Interleaved channel count
    pub channels: u16,
}

impl PcmFormat {
    /// 24kHz mono, as returned by the TTS provider
    pub const PROVIDER: Self = Self {
        sample_rate: 24_000,
        channels: 1,
    };
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self::PROVIDER
    }
}

/// Decoded, immutable audio ready for playback
///
/// Samples are stored planar (one `Vec` per channel), normalized to `[-1.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    /// Build a mono buffer from already-normalized samples
    #[must_use]
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: vec![samples],
        }
    }

    /// Sample rate in Hz
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of channels
    #[must_use]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames (samples per channel)
    #[must_use]
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Samples of one channel
    #[must_use]
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Playback duration
    #[must_use]
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        #[allow(clippy::cast_precision_loss)]
        let frames = self.frames() as f64;
        Duration::from_secs_f64(frames / f64::from(self.sample_rate))
    }

    /// Down-mix all channels into a single mono track
    #[must_use]
    pub fn to_mono(&self) -> Vec<f32> {
        match self.channels.as_slice() {
            [] => Vec::new(),
            [only] => only.clone(),
            all => {
                #[allow(clippy::cast_precision_loss)]
                let count = all.len() as f32;
                (0..self.frames())
                    .map(|i| all.iter().map(|ch| ch[i]).sum::<f32>() / count)
                    .collect()
            }
        }
    }
}

/// Decode a base64 payload of little-endian 16-bit PCM
///
/// # Errors
///
/// Returns `MalformedResponse` if the payload is not valid base64, is empty,
/// or does not contain a whole number of frames
pub fn decode(payload: &str, format: PcmFormat) -> Result<AudioBuffer> {
    let bytes = general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| Error::MalformedResponse(format!("invalid base64 audio: {e}")))?;

    decode_pcm16(&bytes, format)
}

/// Decode raw little-endian 16-bit PCM bytes
///
/// # Errors
///
/// Returns `MalformedResponse` for empty input, odd byte counts, or a sample
/// count that is not a multiple of the channel count
pub fn decode_pcm16(bytes: &[u8], format: PcmFormat) -> Result<AudioBuffer> {
    if bytes.is_empty() {
        return Err(Error::MalformedResponse("empty audio payload".to_string()));
    }
    if bytes.len() % 2 != 0 {
        return Err(Error::MalformedResponse(format!(
            "odd PCM byte count: {}",
            bytes.len()
        )));
    }
    if format.channels == 0 {
        return Err(Error::Config("channel count must be non-zero".to_string()));
    }

    let channel_count = usize::from(format.channels);
    let sample_count = bytes.len() / 2;
    if sample_count % channel_count != 0 {
        return Err(Error::MalformedResponse(format!(
            "{sample_count} samples do not fill {channel_count} channels"
        )));
    }

    let frames = sample_count / channel_count;
    let mut channels = vec![Vec::with_capacity(frames); channel_count];

    for (i, pair) in bytes.chunks_exact(2).enumerate() {
        let sample = i16::from_le_bytes([pair[0], pair[1]]);
        channels[i % channel_count].push(f32::from(sample) / PCM16_SCALE);
    }

    Ok(AudioBuffer {
        sample_rate: format.sample_rate,
        channels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(samples: &[i16]) -> String {
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        general_purpose::STANDARD.encode(bytes)
    }

    #[test]
    fn normalizes_reference_samples() {
        let buffer = decode(&encode(&[16384, -32768, 0, 32767]), PcmFormat::PROVIDER).unwrap();
        let samples = buffer.channel(0).unwrap();

        assert!((samples[0] - 0.5).abs() < f32::EPSILON);
        assert!((samples[1] + 1.0).abs() < f32::EPSILON);
        assert!(samples[2].abs() < f32::EPSILON);
        assert!(samples[3] < 1.0 && samples[3] > 0.999);
    }

    #[test]
    fn sample_count_is_half_byte_count() {
        let bytes = vec![0u8; 480];
        let buffer = decode_pcm16(&bytes, PcmFormat::PROVIDER).unwrap();

        assert_eq!(buffer.frames(), 240);
        assert_eq!(buffer.channel_count(), 1);
        assert_eq!(buffer.sample_rate(), 24_000);
        assert_eq!(buffer.duration(), Duration::from_millis(10));
    }

    #[test]
    fn decoding_is_deterministic() {
        let payload = encode(&[1, -2, 300, -4000, 12345]);
        let a = decode(&payload, PcmFormat::PROVIDER).unwrap();
        let b = decode(&payload, PcmFormat::PROVIDER).unwrap();

        let bits = |buf: &AudioBuffer| -> Vec<u32> {
            buf.channel(0).unwrap().iter().map(|s| s.to_bits()).collect()
        };
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn rejects_odd_length() {
        let err = decode_pcm16(&[0, 0, 0], PcmFormat::PROVIDER).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn rejects_empty_payload() {
        assert!(matches!(
            decode("", PcmFormat::PROVIDER),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(matches!(
            decode("not base64!!", PcmFormat::PROVIDER),
            Err(Error::MalformedResponse(_))
        ));
    }

    #[test]
    fn splits_interleaved_stereo() {
        let format = PcmFormat {
            sample_rate: 48_000,
            channels: 2,
        };
        let buffer = decode(&encode(&[16384, -16384, 0, 8192]), format).unwrap();

        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.frames(), 2);
        assert_eq!(buffer.channel(0).unwrap(), &[0.5, 0.0]);
        assert_eq!(buffer.channel(1).unwrap(), &[-0.5, 0.25]);
        assert_eq!(buffer.to_mono(), vec![0.0, 0.125]);
    }

    #[test]
    fn rejects_partial_stereo_frame() {
        let format = PcmFormat {
            sample_rate: 24_000,
            channels: 2,
        };
        assert!(matches!(
            decode(&encode(&[1, 2, 3]), format),
            Err(Error::MalformedResponse(_))
        ));
    }
}
