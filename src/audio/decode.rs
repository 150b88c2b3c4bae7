//! Speech payload decoding.
//!
//! Synthesis returns base64 text holding either a complete WAV file or bare
//! little-endian 16-bit PCM.  [`decode_payload`] turns both into an
//! [`AudioBuffer`] of `f32` samples:
//!
//! | Payload | Detection | Format source |
//! |---------|-----------|---------------|
//! | WAV | `RIFF` magic | the WAV header (via `hound`) |
//! | raw PCM | anything else | [`AudioConfig`] rate/channels |
//!
//! Each malformed-input case maps to its own [`AudioError`] variant.

use std::io::Cursor;
use std::sync::Arc;

use base64::Engine as _;
use thiserror::Error;

use crate::config::AudioConfig;

// ---------------------------------------------------------------------------
// AudioError
// ---------------------------------------------------------------------------

/// Reason a payload could not be decoded or played.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AudioError {
    /// The payload is not valid base64.
    #[error("audio payload is not valid base64: {0}")]
    Base64(String),

    /// Raw PCM with a length or layout that cannot be 16-bit frames.
    #[error("unsupported audio format: {0}")]
    Format(String),

    /// A `RIFF` payload that `hound` rejected.
    #[error("invalid WAV data: {0}")]
    Wav(String),

    /// The payload decoded to zero samples.
    #[error("audio payload is empty")]
    Empty,

    /// The output device failed to start or run a stream.
    #[error("audio output failed: {0}")]
    Output(String),
}

// ---------------------------------------------------------------------------
// AudioBuffer
// ---------------------------------------------------------------------------

/// Decoded, immutable audio.  Cloning shares the sample storage.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Interleaved samples in `[-1.0, 1.0]`.
    pub samples: Arc<[f32]>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
            channels,
        }
    }

    /// Number of sample frames (samples per channel).
    pub fn frames(&self) -> usize {
        match self.channels {
            0 => 0,
            n => self.samples.len() / n as usize,
        }
    }

    /// Playback length in seconds.
    ///
    /// ```rust
    /// use smartread::audio::AudioBuffer;
    ///
    /// let one_second = AudioBuffer::new(vec![0.0; 48_000], 24_000, 2);
    /// assert_eq!(one_second.duration_secs(), 1.0);
    /// ```
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

// ---------------------------------------------------------------------------
// decode_payload
// ---------------------------------------------------------------------------

/// Decode a base64 speech payload.
///
/// A `data:…;base64,` prefix is accepted and ignored.
///
/// # Errors
///
/// [`AudioError::Base64`] for bad base64, [`AudioError::Empty`] for a payload
/// with no samples, [`AudioError::Format`] for raw PCM with an odd byte
/// count or partial frame, [`AudioError::Wav`] for a corrupt WAV file.
pub fn decode_payload(payload: &str, config: &AudioConfig) -> Result<AudioBuffer, AudioError> {
    let body = payload.trim();
    let body = match body.find(";base64,") {
        Some(idx) if body.starts_with("data:") => &body[idx + ";base64,".len()..],
        _ => body,
    };

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(body)
        .map_err(|e| AudioError::Base64(e.to_string()))?;

    if bytes.is_empty() {
        return Err(AudioError::Empty);
    }

    if bytes.starts_with(b"RIFF") {
        decode_wav(bytes)
    } else {
        decode_pcm16(&bytes, config.sample_rate, config.channels)
    }
}

fn decode_wav(bytes: Vec<u8>) -> Result<AudioBuffer, AudioError> {
    let reader =
        hound::WavReader::new(Cursor::new(bytes)).map_err(|e| AudioError::Wav(e.to_string()))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| AudioError::Wav(e.to_string()))?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| AudioError::Wav(e.to_string()))?
        }
    };

    if samples.is_empty() {
        return Err(AudioError::Empty);
    }

    Ok(AudioBuffer::new(samples, spec.sample_rate, spec.channels))
}

fn decode_pcm16(bytes: &[u8], sample_rate: u32, channels: u16) -> Result<AudioBuffer, AudioError> {
    if channels == 0 || sample_rate == 0 {
        return Err(AudioError::Format(format!(
            "invalid PCM layout: {sample_rate} Hz, {channels} channels"
        )));
    }
    if bytes.len() % 2 != 0 {
        return Err(AudioError::Format(format!(
            "odd byte count {} for 16-bit PCM",
            bytes.len()
        )));
    }
    let frame_bytes = 2 * channels as usize;
    if bytes.len() % frame_bytes != 0 {
        return Err(AudioError::Format(format!(
            "{} bytes is not a whole number of {channels}-channel frames",
            bytes.len()
        )));
    }

    let samples = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32_768.0)
        .collect();

    Ok(AudioBuffer::new(samples, sample_rate, channels))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(bytes: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    fn wav_bytes(samples: &[i16], sample_rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn raw_pcm_uses_configured_format() {
        let bytes: Vec<u8> = [0_i16, 16_384, -32_768]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        let buffer = decode_payload(&encode(&bytes), &AudioConfig::default()).unwrap();

        assert_eq!(buffer.sample_rate, 24_000);
        assert_eq!(buffer.channels, 1);
        assert_eq!(buffer.samples.len(), 3);
        assert!((buffer.samples[1] - 0.5).abs() < 1e-6);
        assert!((buffer.samples[2] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn one_second_of_pcm() {
        let payload = encode(&vec![0u8; 48_000]);
        let buffer = decode_payload(&payload, &AudioConfig::default()).unwrap();
        assert!((buffer.duration_secs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn wav_header_overrides_config() {
        let payload = encode(&wav_bytes(&[0, 1000, -1000, 0], 16_000));
        let buffer = decode_payload(&payload, &AudioConfig::default()).unwrap();
        assert_eq!(buffer.sample_rate, 16_000);
        assert_eq!(buffer.samples.len(), 4);
    }

    #[test]
    fn data_uri_prefix_is_ignored() {
        let payload = format!("data:audio/L16;base64,{}", encode(&[0, 0, 0, 0]));
        let buffer = decode_payload(&payload, &AudioConfig::default()).unwrap();
        assert_eq!(buffer.frames(), 2);
    }

    #[test]
    fn malformed_inputs_are_distinguishable() {
        let config = AudioConfig::default();

        assert!(matches!(
            decode_payload("not base64!!", &config),
            Err(AudioError::Base64(_))
        ));
        assert_eq!(decode_payload("", &config), Err(AudioError::Empty));
        assert!(matches!(
            decode_payload(&encode(&[1, 2, 3]), &config),
            Err(AudioError::Format(_))
        ));
        assert!(matches!(
            decode_payload(&encode(b"RIFF\0\0\0\0garbage"), &config),
            Err(AudioError::Wav(_))
        ));
    }

    #[test]
    fn partial_stereo_frame_is_rejected() {
        let config = AudioConfig {
            sample_rate: 24_000,
            channels: 2,
        };
        assert!(matches!(
            decode_payload(&encode(&[0, 0, 0, 0, 0, 0]), &config),
            Err(AudioError::Format(_))
        ));
    }
}
