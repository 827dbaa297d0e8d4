use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

use super::pcm::{sample_to_i16, AudioBuffer};
use super::playback::AudioSink;

/// Audio sink that renders the playback timeline into a WAV file
///
/// Buffers land at their scheduled start offset; any gap before a buffer is
/// written as silence. Buffers scheduled before the current write head are
/// truncated at the front rather than mixed.
pub struct WavSink {
    path: PathBuf,
    sample_rate: u32,
    inner: Mutex<Timeline>,
}

struct Timeline {
    writer: Option<hound::WavWriter<BufWriter<File>>>,
    /// Samples written so far (the write head)
    written: u64,
}

impl WavSink {
    pub fn create(path: impl AsRef<Path>, sample_rate: u32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).context("Failed to create output directory")?;
            }
        }

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let writer = hound::WavWriter::create(&path, spec)
            .with_context(|| format!("Failed to create WAV file: {:?}", path))?;

        info!("Writing playback timeline to {} ({}Hz)", path.display(), sample_rate);

        Ok(Self {
            path,
            sample_rate,
            inner: Mutex::new(Timeline {
                writer: Some(writer),
                written: 0,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Seconds of audio written, including silence
    pub fn duration_secs(&self) -> f64 {
        let written = self.inner.lock().map(|t| t.written).unwrap_or(0);
        written as f64 / self.sample_rate as f64
    }

    /// Flush and close the file; later buffers are discarded
    pub fn finish(&self) -> Result<()> {
        let mut timeline = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("WAV sink lock poisoned"))?;

        if let Some(writer) = timeline.writer.take() {
            writer.finalize().context("Failed to finalize WAV file")?;
            info!(
                "Playback timeline complete: {} ({:.1}s)",
                self.path.display(),
                timeline.written as f64 / self.sample_rate as f64
            );
        }

        Ok(())
    }

    fn write(&self, buffer: &AudioBuffer, start_time: f64) -> Result<()> {
        let mut timeline = self
            .inner
            .lock()
            .map_err(|_| anyhow::anyhow!("WAV sink lock poisoned"))?;
        let Timeline { writer, written } = &mut *timeline;
        let Some(writer) = writer.as_mut() else {
            return Ok(());
        };

        let start_sample = (start_time.max(0.0) * self.sample_rate as f64).round() as u64;

        while *written < start_sample {
            writer.write_sample(0i16).context("Failed to write silence")?;
            *written += 1;
        }

        let skip = (*written - start_sample) as usize;
        for &sample in buffer.samples.iter().skip(skip) {
            writer
                .write_sample(sample_to_i16(sample))
                .context("Failed to write sample to WAV")?;
            *written += 1;
        }

        Ok(())
    }
}

impl AudioSink for WavSink {
    fn play_at(&self, buffer: &AudioBuffer, start_time: f64) {
        if buffer.sample_rate != self.sample_rate {
            warn!(
                "Dropping {}Hz buffer on {}Hz WAV sink",
                buffer.sample_rate, self.sample_rate
            );
            return;
        }

        if let Err(e) = self.write(buffer, start_time) {
            warn!("Failed to write playback buffer: {}", e);
        }
    }
}

impl Drop for WavSink {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            warn!("Failed to finalize WAV sink on drop: {}", e);
        }
    }
}
