//! JPEG compression of sampled video frames

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use super::frame::VideoFrame;
use crate::error::EncodeError;

/// 2D image encoder provided by the platform
pub trait ImageEncoder: Send + Sync {
    /// Compress `frame`; `quality` is in (0.0, 1.0]
    fn encode_jpeg(&self, frame: &VideoFrame, quality: f32) -> Result<Vec<u8>, EncodeError>;
}

/// Software JPEG encoder backed by the `image` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegFrameEncoder;

/// Map a 0.0..=1.0 quality factor onto the encoder's 1..=100 scale
pub fn quality_percent(quality: f32) -> u8 {
    if quality.is_nan() {
        return 50;
    }
    (quality.clamp(0.01, 1.0) * 100.0).round() as u8
}

impl ImageEncoder for JpegFrameEncoder {
    fn encode_jpeg(&self, frame: &VideoFrame, quality: f32) -> Result<Vec<u8>, EncodeError> {
        if frame.rgb.len() != frame.expected_len() {
            return Err(EncodeError::FrameSize {
                width: frame.width,
                height: frame.height,
                expected: frame.expected_len(),
                actual: frame.rgb.len(),
            });
        }

        let mut jpeg = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, quality_percent(quality));
        encoder
            .encode(&frame.rgb, frame.width, frame.height, ExtendedColorType::Rgb8)
            .map_err(|e| EncodeError::Jpeg(e.to_string()))?;

        Ok(jpeg)
    }
}
