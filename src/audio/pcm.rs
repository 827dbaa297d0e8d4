// PCM16 wire codec
//
// Outbound capture audio is float in [-1.0, 1.0]; the live endpoint wants
// 16-bit little-endian signed PCM. Inbound model audio comes back the same
// way, base64-wrapped, at 24kHz mono.

use base64::Engine;

use crate::error::DecodeError;

/// Sample rate of audio sent to the live endpoint
pub const INPUT_SAMPLE_RATE: u32 = 16000;

/// Sample rate of audio returned by the live endpoint
pub const OUTPUT_SAMPLE_RATE: u32 = 24000;

/// Decoded audio ready for playback (float, mono)
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Playback duration in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Convert one float sample to i16, clipping and mapping NaN to silence
#[inline]
pub fn sample_to_i16(sample: f32) -> i16 {
    if sample.is_nan() {
        return 0;
    }
    let clipped = sample.clamp(-1.0, 1.0);
    if clipped < 0.0 {
        (clipped * 32768.0).round() as i16
    } else {
        (clipped * 32767.0).round() as i16
    }
}

/// Inverse of [`sample_to_i16`]
#[inline]
pub fn i16_to_sample(value: i16) -> f32 {
    if value < 0 {
        value as f32 / 32768.0
    } else {
        value as f32 / 32767.0
    }
}

/// Encode float samples as PCM16LE bytes (2 bytes per sample)
pub fn encode_pcm16(samples: &[f32]) -> Vec<u8> {
    samples
        .iter()
        .flat_map(|&s| sample_to_i16(s).to_le_bytes())
        .collect()
}

/// Decode PCM16LE bytes into float samples
pub fn decode_pcm16(bytes: &[u8]) -> Result<Vec<f32>, DecodeError> {
    if bytes.len() % 2 != 0 {
        return Err(DecodeError::OddLength(bytes.len()));
    }

    Ok(bytes
        .chunks_exact(2)
        .map(|chunk| i16_to_sample(i16::from_le_bytes([chunk[0], chunk[1]])))
        .collect())
}

/// Decode a base64 PCM16LE payload from the live endpoint
pub fn decode_base64_pcm16(payload: &str, sample_rate: u32) -> Result<AudioBuffer, DecodeError> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(payload)?;
    let samples = decode_pcm16(&bytes)?;
    Ok(AudioBuffer::new(samples, sample_rate))
}
