use anyhow::{Context, Result};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

use super::frame::{VideoFrame, VideoTrack};

/// Camera track that always shows one still image
pub struct StillImageTrack {
    label: String,
    frame: VideoFrame,
    stopped: AtomicBool,
}

impl StillImageTrack {
    /// Load an image and fit it inside `max_width` x `max_height`
    pub fn open(path: impl AsRef<Path>, max_width: u32, max_height: u32) -> Result<Self> {
        let path = path.as_ref();
        let mut image = image::open(path)
            .with_context(|| format!("Failed to open image: {}", path.display()))?;

        if image.width() > max_width || image.height() > max_height {
            image = image.resize(max_width, max_height, image::imageops::FilterType::Triangle);
        }

        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        info!("Still image camera: {} ({}x{})", path.display(), width, height);

        Ok(Self::from_frame(
            path.display().to_string(),
            VideoFrame::new(width, height, rgb.into_raw()),
        ))
    }

    pub fn from_frame(label: String, frame: VideoFrame) -> Self {
        Self {
            label,
            frame,
            stopped: AtomicBool::new(false),
        }
    }
}

impl VideoTrack for StillImageTrack {
    fn current_frame(&self) -> VideoFrame {
        if self.stopped.load(Ordering::Acquire) {
            return VideoFrame::new(0, 0, Vec::new());
        }
        self.frame.clone()
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    fn label(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopped_track_has_no_frame() {
        let track = StillImageTrack::from_frame(
            "test".to_string(),
            VideoFrame::new(2, 2, vec![0; 12]),
        );
        assert!(!track.current_frame().is_empty());

        track.stop();
        assert!(track.current_frame().is_empty());
    }
}
