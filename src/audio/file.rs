use anyhow::{Context, Result};
use hound::{SampleFormat, WavReader};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::backend::{AudioFrame, AudioTrack, CaptureConfig};
use super::pcm::i16_to_sample;
use crate::error::MediaAccessError;

pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    /// Interleaved samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path).context("Failed to open WAV file")?;

        let spec = reader.spec();
        let samples: Vec<f32> = match spec.sample_format {
            SampleFormat::Int => reader
                .into_samples::<i16>()
                .map(|s| s.map(i16_to_sample))
                .collect::<Result<Vec<_>, _>>()
                .context("Failed to read audio samples")?,
            SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<Result<Vec<_>, _>>()
                .context("Failed to read audio samples")?,
        };

        let duration_seconds =
            samples.len() as f64 / (spec.sample_rate as f64 * spec.channels as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    /// Mono samples at `target_rate`, the shape the capture context delivers
    pub fn to_mono(&self, target_rate: u32) -> Result<Vec<f32>> {
        let mono = mix_to_mono(&self.samples, self.channels);

        if self.sample_rate == target_rate {
            return Ok(mono);
        }

        let ratio = self.sample_rate / target_rate;
        if ratio <= 1 || self.sample_rate % target_rate != 0 {
            anyhow::bail!(
                "Cannot convert {}Hz to {}Hz (only integer downsampling is supported)",
                self.sample_rate,
                target_rate
            );
        }

        Ok(decimate(&mono, ratio as usize))
    }
}

/// Average interleaved channels into one
fn mix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks_exact(channels as usize)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Downsample by decimation: take every Nth sample
fn decimate(samples: &[f32], ratio: usize) -> Vec<f32> {
    samples.iter().step_by(ratio).copied().collect()
}

/// Microphone track that replays a WAV file in real time
pub struct FileAudioTrack {
    label: String,
    samples: Vec<f32>,
    source_rate: u32,
    task: Option<JoinHandle<()>>,
    stopped: bool,
}

impl FileAudioTrack {
    pub fn open(path: impl AsRef<Path>, capture_rate: u32) -> Result<Self> {
        let file = AudioFile::open(path.as_ref())?;
        let samples = file.to_mono(capture_rate)?;

        Ok(Self {
            label: file.path,
            samples,
            source_rate: capture_rate,
            task: None,
            stopped: false,
        })
    }
}

impl AudioTrack for FileAudioTrack {
    fn start_capture(
        &mut self,
        config: &CaptureConfig,
    ) -> Result<mpsc::Receiver<AudioFrame>, MediaAccessError> {
        if self.stopped {
            return Err(MediaAccessError::Capture(format!(
                "track {} already stopped",
                self.label
            )));
        }
        if self.task.is_some() {
            return Err(MediaAccessError::Capture("already capturing".to_string()));
        }
        if config.sample_rate != self.source_rate || config.buffer_size == 0 {
            return Err(MediaAccessError::Capture(format!(
                "unsupported capture config: {}Hz x {} samples",
                config.sample_rate, config.buffer_size
            )));
        }

        let (tx, rx) = mpsc::channel(16);
        let samples = self.samples.clone();
        let buffer_size = config.buffer_size;
        let sample_rate = config.sample_rate;
        let period = Duration::from_secs_f64(buffer_size as f64 / sample_rate as f64);
        let label = self.label.clone();

        info!(
            "Starting file capture from {} ({}Hz, {} samples per frame)",
            label, sample_rate, buffer_size
        );

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            let mut timestamp_ms = 0u64;

            for chunk in samples.chunks(buffer_size) {
                ticker.tick().await;

                let mut frame_samples = chunk.to_vec();
                frame_samples.resize(buffer_size, 0.0);

                let frame = AudioFrame {
                    samples: frame_samples,
                    sample_rate,
                    timestamp_ms,
                };
                timestamp_ms += frame.duration_ms();

                if tx.send(frame).await.is_err() {
                    break;
                }
            }

            debug!("File capture from {} finished", label);
        });

        self.task = Some(task);
        Ok(rx)
    }

    fn release_capture(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("File capture released: {}", self.label);
        }
    }

    fn stop(&mut self) {
        self.stopped = true;
    }

    fn label(&self) -> &str {
        &self.label
    }
}
