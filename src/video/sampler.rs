// Periodic still-frame sampling of the camera feed
//
// Runs at a fixed rate with no back-pressure from the remote endpoint: a tick
// that finds the previous frame still being sent is dropped, never queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, warn};

use super::frame::VideoTrack;
use super::jpeg::ImageEncoder;
use crate::error::EncodeError;
use crate::transport::OutboundChunk;

/// Shortest sampling period the ticker accepts
pub const MIN_FRAME_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Clone)]
pub struct FrameSampler {
    encoder: Arc<dyn ImageEncoder>,
    period: Duration,
    quality: f32,
    in_flight: Arc<AtomicBool>,
}

/// Held while a sampled frame is being sent; releases the slot on drop
#[derive(Debug)]
pub struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl FrameSampler {
    pub fn new(encoder: Arc<dyn ImageEncoder>, period: Duration, quality: f32) -> Self {
        let period = if period < MIN_FRAME_INTERVAL {
            warn!(
                "Frame interval {}ms too short, using {}ms",
                period.as_millis(),
                MIN_FRAME_INTERVAL.as_millis()
            );
            MIN_FRAME_INTERVAL
        } else {
            period
        };

        Self {
            encoder,
            period,
            quality,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Timer whose first tick fires one period from now
    pub fn ticker(&self) -> Interval {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    }

    /// Claim the single in-flight slot, or `None` if a frame is still sending
    pub fn try_reserve(&self) -> Option<InFlightGuard> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard {
                flag: Arc::clone(&self.in_flight),
            })
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Capture and compress the current frame
    ///
    /// Returns `Ok(None)` when the source has not produced a frame yet.
    pub fn sample(&self, source: &dyn VideoTrack) -> Result<Option<OutboundChunk>, EncodeError> {
        let frame = source.current_frame();
        if frame.is_empty() {
            debug!("No video frame yet from {}, skipping tick", source.label());
            return Ok(None);
        }

        let jpeg = self.encoder.encode_jpeg(&frame, self.quality)?;
        debug!(
            "Sampled {}x{} frame ({} JPEG bytes)",
            frame.width,
            frame.height,
            jpeg.len()
        );

        Ok(Some(OutboundChunk::Image { jpeg }))
    }
}
