pub mod file;
pub mod frame;
pub mod jpeg;
pub mod sampler;

pub use file::StillImageTrack;
pub use frame::{VideoFrame, VideoTrack};
pub use jpeg::{ImageEncoder, JpegFrameEncoder};
pub use sampler::{FrameSampler, InFlightGuard};
