//! Gap-free playback scheduling of inbound model audio
//!
//! Each decoded buffer is queued to start exactly where the previous one
//! ends. When the inbound stream stalls and the cursor falls behind the
//! playback clock, the next buffer starts "now", leaving a silence gap
//! instead of building a backlog of stale audio.

use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use super::pcm::AudioBuffer;

/// Playback timeline clock, in seconds
pub trait PlaybackClock: Send + Sync {
    fn current_time(&self) -> f64;
}

/// Audio output device
pub trait AudioSink: Send + Sync {
    /// Queue `buffer` to begin playing at `start_time` on the clock's timeline
    fn play_at(&self, buffer: &AudioBuffer, start_time: f64);
}

/// Wall clock starting at zero when created
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackClock for MonotonicClock {
    fn current_time(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Placement of one buffer on the playback timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledBuffer {
    pub start_time: f64,
    pub duration: f64,
}

impl ScheduledBuffer {
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }
}

pub struct PlaybackScheduler {
    clock: Arc<dyn PlaybackClock>,
    sink: Arc<dyn AudioSink>,
    /// Where the next buffer begins; never moves backwards except on reset
    next_start_time: f64,
}

impl PlaybackScheduler {
    pub fn new(clock: Arc<dyn PlaybackClock>, sink: Arc<dyn AudioSink>) -> Self {
        Self {
            clock,
            sink,
            next_start_time: 0.0,
        }
    }

    /// Queue a buffer behind everything scheduled so far
    pub fn schedule(&mut self, buffer: &AudioBuffer) -> ScheduledBuffer {
        let now = self.clock.current_time();
        if self.next_start_time < now {
            if self.next_start_time > 0.0 {
                debug!(
                    "Playback queue drained ({:.3}s behind), restarting at {:.3}s",
                    now - self.next_start_time,
                    now
                );
            }
            self.next_start_time = now;
        }

        let scheduled = ScheduledBuffer {
            start_time: self.next_start_time,
            duration: buffer.duration(),
        };

        self.sink.play_at(buffer, scheduled.start_time);
        self.next_start_time += scheduled.duration;

        scheduled
    }

    pub fn next_start_time(&self) -> f64 {
        self.next_start_time
    }

    /// Rewind the cursor; only used on session teardown
    pub fn reset(&mut self) {
        self.next_start_time = 0.0;
    }
}
