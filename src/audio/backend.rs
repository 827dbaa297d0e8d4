use tokio::sync::mpsc;

use crate::error::MediaAccessError;

/// One capture tick of microphone audio (float, mono, already at capture rate)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

impl AudioFrame {
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.samples.len() as u64 * 1000 / self.sample_rate as u64
    }
}

/// Configuration for the capture context
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Rate the capture context resamples to before delivering frames
    pub sample_rate: u32,
    /// Samples per delivered frame
    pub buffer_size: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000, // live endpoint input rate
            buffer_size: 4096,
        }
    }
}

/// Microphone track of a media stream
///
/// Platform implementations deliver frames over a channel; there is no
/// audible passthrough to keep the capture callback running.
pub trait AudioTrack: Send {
    /// Open the capture context and connect the capture node
    ///
    /// Returns a channel receiver that will receive audio frames
    fn start_capture(
        &mut self,
        config: &CaptureConfig,
    ) -> Result<mpsc::Receiver<AudioFrame>, MediaAccessError>;

    /// Disconnect the capture node and close the capture context
    fn release_capture(&mut self);

    /// Stop the underlying hardware track
    fn stop(&mut self);

    /// Track label for logging
    fn label(&self) -> &str;
}
