//! Camera + microphone acquisition
//!
//! A [`MediaStream`] bundles one microphone track and one camera track. It is
//! owned by exactly one session and stops its tracks when released.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::audio::{AudioTrack, FileAudioTrack};
use crate::error::MediaAccessError;
use crate::video::{StillImageTrack, VideoTrack};

/// What the session asks the platform for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video_width: u32,
    pub video_height: u32,
    /// Rate the microphone capture context runs at
    pub audio_sample_rate: u32,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video_width: 640,
            video_height: 360,
            audio_sample_rate: 16000,
        }
    }
}

/// Live microphone + camera
pub struct MediaStream {
    audio: Box<dyn AudioTrack>,
    video: Arc<dyn VideoTrack>,
    stopped: bool,
}

impl MediaStream {
    pub fn new(audio: Box<dyn AudioTrack>, video: Arc<dyn VideoTrack>) -> Self {
        Self {
            audio,
            video,
            stopped: false,
        }
    }

    pub fn audio_mut(&mut self) -> &mut dyn AudioTrack {
        self.audio.as_mut()
    }

    pub fn video(&self) -> Arc<dyn VideoTrack> {
        Arc::clone(&self.video)
    }

    /// Stop the tracks, then release the capture context
    ///
    /// Safe to call more than once.
    pub fn release(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        self.audio.stop();
        self.video.stop();
        self.audio.release_capture();

        info!(
            "Media stream released (audio: {}, video: {})",
            self.audio.label(),
            self.video.label()
        );
    }

    pub fn is_released(&self) -> bool {
        self.stopped
    }
}

impl Drop for MediaStream {
    fn drop(&mut self) {
        self.release();
    }
}

/// Platform media device access
#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn acquire(&self, constraints: &MediaConstraints)
        -> Result<MediaStream, MediaAccessError>;
}

/// Devices backed by a WAV file (microphone) and a still image (camera)
#[derive(Debug, Clone)]
pub struct FileMediaDevices {
    pub audio_path: PathBuf,
    pub image_path: PathBuf,
}

impl FileMediaDevices {
    pub fn new(audio_path: impl Into<PathBuf>, image_path: impl Into<PathBuf>) -> Self {
        Self {
            audio_path: audio_path.into(),
            image_path: image_path.into(),
        }
    }
}

#[async_trait]
impl MediaDevices for FileMediaDevices {
    async fn acquire(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<MediaStream, MediaAccessError> {
        if !constraints.audio {
            return Err(MediaAccessError::Denied(
                "audio is required for a live session".to_string(),
            ));
        }

        let audio_path = self.audio_path.clone();
        let image_path = self.image_path.clone();
        let constraints = constraints.clone();

        // Decoding files is blocking work
        let (audio, video) = tokio::task::spawn_blocking(move || {
            let audio = FileAudioTrack::open(&audio_path, constraints.audio_sample_rate)
                .map_err(|e| MediaAccessError::Unavailable(format!("{:#}", e)))?;
            let video = StillImageTrack::open(
                &image_path,
                constraints.video_width,
                constraints.video_height,
            )
            .map_err(|e| MediaAccessError::Unavailable(format!("{:#}", e)))?;
            Ok::<_, MediaAccessError>((audio, video))
        })
        .await
        .map_err(|e| MediaAccessError::Unavailable(format!("device task failed: {}", e)))??;

        Ok(MediaStream::new(Box::new(audio), Arc::new(video)))
    }
}
