//! Error types for the live session pipeline.
//!
//! Device and connection failures end a session. Decode and encode failures
//! are per-chunk and only ever drop the chunk that caused them.

use thiserror::Error;

/// Camera/microphone acquisition failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaAccessError {
    #[error("media access denied: {0}")]
    Denied(String),

    #[error("media device unavailable: {0}")]
    Unavailable(String),

    #[error("audio capture failed: {0}")]
    Capture(String),
}

/// The remote endpoint rejected, dropped, or errored the connection
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("failed to connect to live endpoint: {0}")]
    Handshake(String),

    #[error("live protocol error: {0}")]
    Protocol(String),

    #[error("live endpoint reported an error: {0}")]
    Remote(String),

    #[error("connection closed")]
    Closed,
}

/// An inbound audio chunk could not be turned into samples
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("invalid base64 audio payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("PCM16 payload has odd length {0}")]
    OddLength(usize),
}

/// A captured video frame could not be compressed
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("frame buffer is {actual} bytes, expected {expected} for {width}x{height} RGB")]
    FrameSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("JPEG encoding failed: {0}")]
    Jpeg(String),
}

/// Terminal session failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Media(#[from] MediaAccessError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

impl SessionError {
    /// Message shown to the user for this failure
    pub fn user_message(&self) -> &'static str {
        match self {
            SessionError::Media(_) => "Failed to access camera/microphone or connect to API.",
            SessionError::Connection(ConnectionError::Handshake(_)) => {
                "Failed to access camera/microphone or connect to API."
            }
            SessionError::Connection(_) => "Connection error. Please check console.",
        }
    }
}
