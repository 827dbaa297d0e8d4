pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod media;
pub mod session;
pub mod transport;
pub mod video;

pub use audio::{
    AudioBuffer, AudioFile, AudioFrame, AudioSink, AudioTrack, CaptureConfig, MonotonicClock,
    PlaybackClock, PlaybackScheduler, WavSink,
};
pub use config::Config;
pub use error::{ConnectionError, DecodeError, EncodeError, MediaAccessError, SessionError};
pub use http::{create_router, AppState};
pub use media::{FileMediaDevices, MediaConstraints, MediaDevices, MediaStream};
pub use session::{LiveSession, SessionConfig, SessionPlatform, SessionState, SessionStats};
pub use transport::{
    GeminiTransportFactory, OutboundChunk, RealtimeInput, ServerMessage, Transport,
    TransportEvent, TransportFactory,
};
pub use video::{FrameSampler, ImageEncoder, JpegFrameEncoder, VideoFrame, VideoTrack};
