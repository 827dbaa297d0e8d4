//! Live session management
//!
//! This module provides the `LiveSession` abstraction that manages:
//! - Camera/microphone acquisition and release
//! - The duplex connection lifecycle (open, error, close)
//! - Outbound PCM audio and sampled JPEG frames, with audio-only mute
//! - Gap-free playback scheduling of inbound model audio
//! - Session statistics and state management

mod config;
#[allow(clippy::module_inception)]
mod session;
mod state;
mod stats;

pub use config::SessionConfig;
pub use session::{LiveSession, SessionPlatform, SessionStatus};
pub use state::{SessionState, Trigger};
pub use stats::SessionStats;
