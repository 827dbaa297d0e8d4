/// Snapshot of the live video element (packed RGB8, row-major)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32, rgb: Vec<u8>) -> Self {
        Self { width, height, rgb }
    }

    /// True until the camera has produced its first frame
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

/// Camera track of a media stream
pub trait VideoTrack: Send + Sync {
    /// Current bitmap; zero dimensions until the first frame arrives
    fn current_frame(&self) -> VideoFrame;

    /// Stop the underlying hardware track
    fn stop(&self);

    fn label(&self) -> &str;
}
