use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::state::SessionState;

/// Statistics about a live session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,

    pub state: SessionState,

    /// Whether outbound audio is currently gated
    pub muted: bool,

    /// When `start()` was accepted; `None` while idle
    pub started_at: Option<DateTime<Utc>>,

    /// Seconds since start, frozen once the session ends
    pub duration_secs: f64,

    /// Audio chunks handed to the transport
    pub audio_chunks_sent: usize,

    /// Audio chunks dropped because the send queue was full
    pub audio_chunks_dropped: usize,

    /// Captured audio frames dropped because of mute
    pub audio_frames_muted: usize,

    /// Video frames handed to the transport
    pub image_frames_sent: usize,

    /// Sampler ticks with no frame, a frame still in flight, or an encode failure
    pub image_frames_skipped: usize,

    /// Inbound audio chunks queued for playback
    pub inbound_chunks_scheduled: usize,

    /// Inbound audio chunks that failed to decode
    pub inbound_chunks_dropped: usize,

    /// User-facing message for the failure that ended the session
    pub error: Option<String>,
}

/// Live counters shared between the session task and its handles
#[derive(Debug, Default)]
pub(crate) struct SessionCounters {
    pub audio_chunks_sent: AtomicUsize,
    pub audio_chunks_dropped: AtomicUsize,
    pub audio_frames_muted: AtomicUsize,
    pub image_frames_sent: AtomicUsize,
    pub image_frames_skipped: AtomicUsize,
    pub inbound_chunks_scheduled: AtomicUsize,
    pub inbound_chunks_dropped: AtomicUsize,
}

impl SessionCounters {
    pub fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
    }

    pub fn read(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}
