// Test doubles for the platform and the remote endpoint
//
// Lets the session state machine run without hardware or network.

#![allow(dead_code)]

use async_trait::async_trait;
use live_assist::audio::{AudioBuffer, AudioFrame, AudioSink, AudioTrack, CaptureConfig, PlaybackClock};
use live_assist::error::{ConnectionError, MediaAccessError};
use live_assist::media::{MediaConstraints, MediaDevices, MediaStream};
use live_assist::session::{SessionConfig, SessionPlatform};
use live_assist::transport::{RealtimeInput, SetupMessage, Transport, TransportEvent, TransportFactory};
use live_assist::video::{JpegFrameEncoder, VideoFrame, VideoTrack};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Observations shared by the fake tracks
#[derive(Default)]
pub struct TrackProbe {
    pub audio_stopped: AtomicBool,
    pub video_stopped: AtomicBool,
    pub capture_started: AtomicUsize,
    pub capture_released: AtomicBool,
    /// Set when the capture context is released; false if tracks were still live
    pub released_after_stop: AtomicBool,
    pub frames: Mutex<Option<mpsc::Sender<AudioFrame>>>,
}

impl TrackProbe {
    pub fn frame_sender(&self) -> Option<mpsc::Sender<AudioFrame>> {
        self.frames.lock().unwrap().clone()
    }
}

pub struct FakeAudioTrack {
    probe: Arc<TrackProbe>,
}

impl AudioTrack for FakeAudioTrack {
    fn start_capture(
        &mut self,
        _config: &CaptureConfig,
    ) -> Result<mpsc::Receiver<AudioFrame>, MediaAccessError> {
        let (tx, rx) = mpsc::channel(16);
        *self.probe.frames.lock().unwrap() = Some(tx);
        self.probe.capture_started.fetch_add(1, Ordering::SeqCst);
        Ok(rx)
    }

    fn release_capture(&mut self) {
        let tracks_stopped = self.probe.audio_stopped.load(Ordering::SeqCst)
            && self.probe.video_stopped.load(Ordering::SeqCst);
        self.probe
            .released_after_stop
            .store(tracks_stopped, Ordering::SeqCst);
        self.probe.capture_released.store(true, Ordering::SeqCst);
        self.probe.frames.lock().unwrap().take();
    }

    fn stop(&mut self) {
        self.probe.audio_stopped.store(true, Ordering::SeqCst);
    }

    fn label(&self) -> &str {
        "fake-mic"
    }
}

pub struct FakeVideoTrack {
    probe: Arc<TrackProbe>,
    frame: VideoFrame,
}

impl VideoTrack for FakeVideoTrack {
    fn current_frame(&self) -> VideoFrame {
        self.frame.clone()
    }

    fn stop(&self) {
        self.probe.video_stopped.store(true, Ordering::SeqCst);
    }

    fn label(&self) -> &str {
        "fake-camera"
    }
}

pub struct FakeDevices {
    pub probe: Arc<TrackProbe>,
    pub grant: bool,
    pub frame: VideoFrame,
    pub acquired: AtomicUsize,
}

impl FakeDevices {
    pub fn granting(frame: VideoFrame) -> Self {
        Self {
            probe: Arc::new(TrackProbe::default()),
            grant: true,
            frame,
            acquired: AtomicUsize::new(0),
        }
    }

    pub fn denying() -> Self {
        Self {
            grant: false,
            ..Self::granting(VideoFrame::new(0, 0, Vec::new()))
        }
    }
}

#[async_trait]
impl MediaDevices for FakeDevices {
    async fn acquire(
        &self,
        _constraints: &MediaConstraints,
    ) -> Result<MediaStream, MediaAccessError> {
        if !self.grant {
            return Err(MediaAccessError::Denied("permission dismissed".to_string()));
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);

        Ok(MediaStream::new(
            Box::new(FakeAudioTrack {
                probe: Arc::clone(&self.probe),
            }),
            Arc::new(FakeVideoTrack {
                probe: Arc::clone(&self.probe),
                frame: self.frame.clone(),
            }),
        ))
    }
}

#[derive(Default)]
pub struct FakeTransport {
    pub sent: Mutex<Vec<RealtimeInput>>,
    pub closed: AtomicBool,
    /// Every send hangs forever, like a socket whose writer has stalled
    pub stalled: AtomicBool,
    pub sends_started: AtomicUsize,
}

impl FakeTransport {
    pub fn sent_of_kind(&self, mime_prefix: &str) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.media.mime_type.starts_with(mime_prefix))
            .count()
    }

    pub fn audio_sent(&self) -> usize {
        self.sent_of_kind("audio/")
    }

    pub fn images_sent(&self) -> usize {
        self.sent_of_kind("image/")
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, input: RealtimeInput) -> Result<(), ConnectionError> {
        self.sends_started.fetch_add(1, Ordering::SeqCst);
        if self.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.closed.load(Ordering::SeqCst) {
            return Err(ConnectionError::Closed);
        }
        self.sent.lock().unwrap().push(input);
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct FakeTransportFactory {
    pub transport: Arc<FakeTransport>,
    pub events: Mutex<Option<mpsc::Sender<TransportEvent>>>,
    pub setup: Mutex<Option<SetupMessage>>,
    pub reject: bool,
}

impl FakeTransportFactory {
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Default::default()
        }
    }

    pub fn stalling() -> Self {
        let factory = Self::default();
        factory.transport.stalled.store(true, Ordering::SeqCst);
        factory
    }

    pub fn event_sender(&self) -> Option<mpsc::Sender<TransportEvent>> {
        self.events.lock().unwrap().clone()
    }

    pub async fn emit(&self, event: TransportEvent) -> bool {
        match self.event_sender() {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl TransportFactory for FakeTransportFactory {
    async fn connect(
        &self,
        setup: &SetupMessage,
    ) -> Result<(Arc<dyn Transport>, mpsc::Receiver<TransportEvent>), ConnectionError> {
        if self.reject {
            return Err(ConnectionError::Handshake("401 unauthorized".to_string()));
        }
        let (tx, rx) = mpsc::channel(16);
        *self.events.lock().unwrap() = Some(tx);
        *self.setup.lock().unwrap() = Some(setup.clone());
        Ok((self.transport.clone() as Arc<dyn Transport>, rx))
    }
}

/// Clock the test moves by hand
#[derive(Default)]
pub struct ManualClock {
    now: Mutex<f64>,
}

impl ManualClock {
    pub fn at(now: f64) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: f64) {
        *self.now.lock().unwrap() = now;
    }
}

impl PlaybackClock for ManualClock {
    fn current_time(&self) -> f64 {
        *self.now.lock().unwrap()
    }
}

/// Sink that records (start_time, duration) for each buffer
#[derive(Default)]
pub struct RecordingSink {
    pub played: Mutex<Vec<(f64, f64)>>,
}

impl RecordingSink {
    pub fn starts(&self) -> Vec<f64> {
        self.played.lock().unwrap().iter().map(|(s, _)| *s).collect()
    }
}

impl AudioSink for RecordingSink {
    fn play_at(&self, buffer: &AudioBuffer, start_time: f64) {
        self.played
            .lock()
            .unwrap()
            .push((start_time, buffer.duration()));
    }
}

/// Everything a session test needs to drive and observe a session
pub struct Harness {
    pub devices: Arc<FakeDevices>,
    pub factory: Arc<FakeTransportFactory>,
    pub clock: Arc<ManualClock>,
    pub sink: Arc<RecordingSink>,
}

impl Harness {
    pub fn new(devices: FakeDevices, factory: FakeTransportFactory) -> Self {
        Self {
            devices: Arc::new(devices),
            factory: Arc::new(factory),
            clock: Arc::new(ManualClock::at(0.0)),
            sink: Arc::new(RecordingSink::default()),
        }
    }

    pub fn platform(&self) -> SessionPlatform {
        SessionPlatform {
            devices: self.devices.clone(),
            transport: self.factory.clone(),
            image_encoder: Arc::new(JpegFrameEncoder),
            clock: self.clock.clone(),
            sink: self.sink.clone(),
        }
    }

    pub fn probe(&self) -> &TrackProbe {
        &self.devices.probe
    }
}

/// Session config with an effectively disabled video timer
pub fn audio_only_config() -> SessionConfig {
    SessionConfig {
        frame_interval: Duration::from_secs(3600),
        ..SessionConfig::default()
    }
}

pub fn tone_frame(timestamp_ms: u64) -> AudioFrame {
    AudioFrame {
        samples: (0..4096).map(|i| (i as f32 / 4096.0) - 0.5).collect(),
        sample_rate: 16000,
        timestamp_ms,
    }
}

/// Poll `condition` until it holds or two seconds pass
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
