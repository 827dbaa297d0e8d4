use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Interval;
use tracing::{debug, error, info, warn};

use super::config::SessionConfig;
use super::state::{SessionState, Trigger};
use super::stats::{SessionCounters, SessionStats};
use crate::audio::{decode_base64_pcm16, AudioFrame, AudioSink, PlaybackClock, PlaybackScheduler};
use crate::error::{ConnectionError, SessionError};
use crate::media::{MediaDevices, MediaStream};
use crate::transport::{
    OutboundChunk, ServerMessage, Transport, TransportEvent, TransportFactory,
};
use crate::video::{FrameSampler, ImageEncoder};

/// Platform services a session runs on
#[derive(Clone)]
pub struct SessionPlatform {
    pub devices: Arc<dyn MediaDevices>,
    pub transport: Arc<dyn TransportFactory>,
    pub image_encoder: Arc<dyn ImageEncoder>,
    pub clock: Arc<dyn PlaybackClock>,
    pub sink: Arc<dyn AudioSink>,
}

/// Outbound audio chunks buffered ahead of the transport
const AUDIO_QUEUE_DEPTH: usize = 32;

/// State plus the user-facing error, published on every transition
#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub state: SessionState,
    pub error: Option<String>,
    /// Set on `Idle -> Connecting`
    pub started_at: Option<DateTime<Utc>>,
    /// Set when a started session reaches `Error` or `Closed`
    pub ended_at: Option<DateTime<Utc>>,
}

enum Command {
    Start(oneshot::Sender<std::result::Result<(), SessionState>>),
    Stop(oneshot::Sender<()>),
}

/// Handle to a live audio/video session
///
/// All session state lives in one task; the handle only sends commands,
/// flips the mute gate, and reads published status and counters.
#[derive(Clone)]
pub struct LiveSession {
    session_id: String,
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<SessionStatus>,
    muted: Arc<AtomicBool>,
    counters: Arc<SessionCounters>,
}

impl LiveSession {
    /// Create a session in `Idle`; must be called inside a tokio runtime
    pub fn spawn(config: SessionConfig, platform: SessionPlatform) -> Self {
        info!("Creating live session: {}", config.session_id);

        let (command_tx, command_rx) = mpsc::channel(8);
        let (status_tx, status_rx) = watch::channel(SessionStatus {
            state: SessionState::Idle,
            error: None,
            started_at: None,
            ended_at: None,
        });
        let muted = Arc::new(AtomicBool::new(false));
        let counters = Arc::new(SessionCounters::default());

        let sampler = FrameSampler::new(
            Arc::clone(&platform.image_encoder),
            config.frame_interval,
            config.jpeg_quality,
        );
        let scheduler = PlaybackScheduler::new(
            Arc::clone(&platform.clock),
            Arc::clone(&platform.sink),
        );

        let session = Self {
            session_id: config.session_id.clone(),
            commands: command_tx,
            status: status_rx,
            muted: Arc::clone(&muted),
            counters: Arc::clone(&counters),
        };

        let actor = SessionActor {
            config,
            devices: platform.devices,
            transport: platform.transport,
            phase: Phase::Idle,
            state: SessionState::Idle,
            last_error: None,
            started_at: None,
            ended_at: None,
            status: status_tx,
            muted,
            counters,
            sampler,
            scheduler,
        };

        tokio::spawn(actor.run(command_rx));

        session
    }

    pub fn id(&self) -> &str {
        &self.session_id
    }

    /// Acquire media and open the live connection (`Idle` -> `Connecting`)
    ///
    /// Returns once the session is `Connecting`; watch [`Self::state`] or use
    /// [`Self::wait_for`] to see it go `Live`.
    pub async fn start(&self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Start(reply_tx))
            .await
            .map_err(|_| anyhow!("Session {} task has exited", self.session_id))?;

        match reply_rx.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(state)) => bail!("Cannot start session in state {:?}", state),
            Err(_) => bail!("Session {} task has exited", self.session_id),
        }
    }

    /// Tear down and move to `Closed`; safe to call in any state, any number of times
    pub async fn stop(&self) -> SessionStats {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.commands.send(Command::Stop(reply_tx)).await.is_ok() {
            let _ = reply_rx.await;
        }
        self.stats()
    }

    /// Gate outbound audio; video keeps flowing while muted
    pub fn set_muted(&self, muted: bool) {
        let was = self.muted.swap(muted, Ordering::SeqCst);
        if was != muted {
            info!("Session {} {}", self.session_id, if muted { "muted" } else { "unmuted" });
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> SessionState {
        self.status.borrow().state
    }

    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    /// Wait until the published state satisfies `predicate`
    pub async fn wait_for(&self, predicate: impl Fn(SessionState) -> bool) -> SessionState {
        let mut status = self.status.clone();
        let state = match status.wait_for(|s| predicate(s.state)).await {
            Ok(s) => s.state,
            Err(_) => self.state(),
        };
        state
    }

    /// Get current session statistics
    pub fn stats(&self) -> SessionStats {
        let status = self.status();
        let duration_secs = match status.started_at {
            Some(started) => {
                let end = status.ended_at.unwrap_or_else(Utc::now);
                end.signed_duration_since(started).num_milliseconds() as f64 / 1000.0
            }
            None => 0.0,
        };
        let c = &self.counters;

        SessionStats {
            session_id: self.session_id.clone(),
            state: status.state,
            muted: self.is_muted(),
            started_at: status.started_at,
            duration_secs,
            audio_chunks_sent: SessionCounters::read(&c.audio_chunks_sent),
            audio_chunks_dropped: SessionCounters::read(&c.audio_chunks_dropped),
            audio_frames_muted: SessionCounters::read(&c.audio_frames_muted),
            image_frames_sent: SessionCounters::read(&c.image_frames_sent),
            image_frames_skipped: SessionCounters::read(&c.image_frames_skipped),
            inbound_chunks_scheduled: SessionCounters::read(&c.inbound_chunks_scheduled),
            inbound_chunks_dropped: SessionCounters::read(&c.inbound_chunks_dropped),
            error: status.error,
        }
    }
}

/// Media stream + connection, before the remote has opened
struct Acquired {
    stream: MediaStream,
    transport: Arc<dyn Transport>,
    events: mpsc::Receiver<TransportEvent>,
}

/// Everything wired while `Live`
struct LivePipeline {
    stream: MediaStream,
    transport: Arc<dyn Transport>,
    events: mpsc::Receiver<TransportEvent>,
    /// `None` once the capture source has ended
    frames: Option<mpsc::Receiver<AudioFrame>>,
    ticker: Interval,
    /// Capture-ordered queue drained by `audio_sender`
    audio: mpsc::Sender<OutboundChunk>,
    audio_sender: JoinHandle<()>,
}

/// Resources held in each state; dropping a phase releases them
enum Phase {
    Idle,
    /// Waiting on media grant and connection (state `Connecting`)
    Acquiring(BoxFuture<'static, std::result::Result<Acquired, SessionError>>),
    /// Connected, waiting for the remote open event (state `Connecting`)
    Connecting(Acquired),
    Live(LivePipeline),
    /// `Error` or `Closed`
    Done,
}

enum Event {
    Command(Option<Command>),
    Setup(std::result::Result<Acquired, SessionError>),
    Transport(Option<TransportEvent>),
    Audio(Option<AudioFrame>),
    FrameTick,
}

struct SessionActor {
    config: SessionConfig,
    devices: Arc<dyn MediaDevices>,
    transport: Arc<dyn TransportFactory>,
    phase: Phase,
    state: SessionState,
    last_error: Option<String>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    status: watch::Sender<SessionStatus>,
    muted: Arc<AtomicBool>,
    counters: Arc<SessionCounters>,
    sampler: FrameSampler,
    scheduler: PlaybackScheduler,
}

/// Send queued audio in order without holding up the session task
fn spawn_audio_sender(
    transport: Arc<dyn Transport>,
    counters: Arc<SessionCounters>,
) -> (mpsc::Sender<OutboundChunk>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<OutboundChunk>(AUDIO_QUEUE_DEPTH);

    let task = tokio::spawn(async move {
        while let Some(chunk) = rx.recv().await {
            match transport.send(chunk.to_realtime_input()).await {
                Ok(()) => SessionCounters::bump(&counters.audio_chunks_sent),
                Err(e) => warn!("Failed to send audio chunk: {}", e),
            }
        }
        debug!("Audio sender stopped");
    });

    (tx, task)
}

async fn recv_frame(frames: &mut Option<mpsc::Receiver<AudioFrame>>) -> Option<AudioFrame> {
    match frames {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

impl SessionActor {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        loop {
            let event = match &mut self.phase {
                Phase::Acquiring(setup) => tokio::select! {
                    cmd = commands.recv() => Event::Command(cmd),
                    result = setup => Event::Setup(result),
                },
                Phase::Connecting(acquired) => tokio::select! {
                    cmd = commands.recv() => Event::Command(cmd),
                    ev = acquired.events.recv() => Event::Transport(ev),
                },
                Phase::Live(live) => tokio::select! {
                    cmd = commands.recv() => Event::Command(cmd),
                    ev = live.events.recv() => Event::Transport(ev),
                    frame = recv_frame(&mut live.frames) => Event::Audio(frame),
                    _ = live.ticker.tick() => Event::FrameTick,
                },
                Phase::Idle | Phase::Done => Event::Command(commands.recv().await),
            };

            if let Event::Command(None) = event {
                // Every handle is gone
                self.finish(Trigger::Stop, None).await;
                break;
            }

            self.handle(event).await;
        }

        debug!("Session {} task exited", self.config.session_id);
    }

    async fn handle(&mut self, event: Event) {
        match event {
            Event::Command(Some(Command::Start(reply))) => {
                let _ = reply.send(self.begin());
            }
            Event::Command(Some(Command::Stop(reply))) => {
                self.finish(Trigger::Stop, None).await;
                let _ = reply.send(());
            }
            Event::Command(None) => {}
            Event::Setup(Ok(acquired)) => {
                info!(
                    "Session {} connected, waiting for remote open",
                    self.config.session_id
                );
                self.phase = Phase::Connecting(acquired);
            }
            Event::Setup(Err(e)) => {
                self.finish(Trigger::SetupFailed, Some(e)).await;
            }
            Event::Transport(Some(TransportEvent::Open)) => {
                self.go_live().await;
            }
            Event::Transport(Some(TransportEvent::Message(message))) => {
                self.on_server_message(&message);
            }
            Event::Transport(Some(TransportEvent::Error(reason))) => {
                let err = SessionError::Connection(ConnectionError::Remote(reason));
                self.finish(Trigger::RemoteError, Some(err)).await;
            }
            Event::Transport(Some(TransportEvent::Close(reason))) => {
                info!(
                    "Live connection closed by remote ({})",
                    reason.as_deref().unwrap_or("no reason")
                );
                self.finish(Trigger::RemoteClose, None).await;
            }
            Event::Transport(None) => {
                info!("Live connection event stream ended");
                self.finish(Trigger::RemoteClose, None).await;
            }
            Event::Audio(Some(frame)) => {
                self.on_audio_frame(frame);
            }
            Event::Audio(None) => {
                info!("Audio capture source ended");
                if let Phase::Live(live) = &mut self.phase {
                    live.frames = None;
                }
            }
            Event::FrameTick => {
                self.on_frame_tick();
            }
        }
    }

    fn begin(&mut self) -> std::result::Result<(), SessionState> {
        let Some(next) = self.state.next(Trigger::Start) else {
            warn!("Session {} cannot start from {:?}", self.config.session_id, self.state);
            return Err(self.state);
        };

        let devices = Arc::clone(&self.devices);
        let factory = Arc::clone(&self.transport);
        let constraints = self.config.constraints.clone();
        let setup = self.config.setup_message();

        let acquire = async move {
            let stream = devices.acquire(&constraints).await?;
            info!("Media access granted");
            let (transport, events) = factory.connect(&setup).await?;
            Ok::<_, SessionError>(Acquired {
                stream,
                transport,
                events,
            })
        };

        self.phase = Phase::Acquiring(acquire.boxed());
        self.started_at = Some(Utc::now());
        self.transition(next);
        Ok(())
    }

    async fn go_live(&mut self) {
        let Some(next) = self.state.next(Trigger::RemoteOpen) else {
            debug!("Ignoring remote open in {:?}", self.state);
            return;
        };

        let mut acquired = match std::mem::replace(&mut self.phase, Phase::Done) {
            Phase::Connecting(acquired) => acquired,
            other => {
                self.phase = other;
                debug!("Ignoring remote open before connection is established");
                return;
            }
        };

        let frames = match acquired.stream.audio_mut().start_capture(&self.config.capture) {
            Ok(frames) => frames,
            Err(e) => {
                self.phase = Phase::Connecting(acquired);
                self.finish(Trigger::SetupFailed, Some(e.into())).await;
                return;
            }
        };

        info!(
            "Capture started ({}Hz, {} samples per frame, video every {}ms)",
            self.config.capture.sample_rate,
            self.config.capture.buffer_size,
            self.sampler.period().as_millis()
        );

        let (audio, audio_sender) =
            spawn_audio_sender(Arc::clone(&acquired.transport), Arc::clone(&self.counters));

        self.phase = Phase::Live(LivePipeline {
            stream: acquired.stream,
            transport: acquired.transport,
            events: acquired.events,
            frames: Some(frames),
            ticker: self.sampler.ticker(),
            audio,
            audio_sender,
        });
        self.transition(next);
    }

    fn on_audio_frame(&mut self, frame: AudioFrame) {
        if self.muted.load(Ordering::SeqCst) {
            SessionCounters::bump(&self.counters.audio_frames_muted);
            return;
        }

        let Phase::Live(live) = &self.phase else {
            return;
        };

        let chunk = OutboundChunk::audio(&frame.samples, frame.sample_rate);
        match live.audio.try_send(chunk) {
            Ok(()) => debug!(
                "Queued audio chunk at {}ms ({} samples)",
                frame.timestamp_ms,
                frame.samples.len()
            ),
            Err(TrySendError::Full(_)) => {
                warn!(
                    "Audio send queue full, dropping frame at {}ms",
                    frame.timestamp_ms
                );
                SessionCounters::bump(&self.counters.audio_chunks_dropped);
            }
            Err(TrySendError::Closed(_)) => {
                warn!("Audio sender has stopped, dropping frame at {}ms", frame.timestamp_ms);
                SessionCounters::bump(&self.counters.audio_chunks_dropped);
            }
        }
    }

    fn on_frame_tick(&mut self) {
        let Phase::Live(live) = &self.phase else {
            return;
        };

        let Some(guard) = self.sampler.try_reserve() else {
            debug!("Previous video frame still in flight, dropping tick");
            SessionCounters::bump(&self.counters.image_frames_skipped);
            return;
        };

        let video = live.stream.video();
        match self.sampler.sample(video.as_ref()) {
            Ok(Some(chunk)) => {
                let transport = Arc::clone(&live.transport);
                let counters = Arc::clone(&self.counters);
                tokio::spawn(async move {
                    let _guard = guard;
                    match transport.send(chunk.to_realtime_input()).await {
                        Ok(()) => SessionCounters::bump(&counters.image_frames_sent),
                        Err(e) => debug!("Failed to send video frame: {}", e),
                    }
                });
            }
            Ok(None) => SessionCounters::bump(&self.counters.image_frames_skipped),
            Err(e) => {
                warn!("Failed to encode video frame: {}", e);
                SessionCounters::bump(&self.counters.image_frames_skipped);
            }
        }
    }

    fn on_server_message(&mut self, message: &ServerMessage) {
        if !matches!(self.phase, Phase::Live(_)) {
            debug!("Ignoring server message while {:?}", self.state);
            return;
        }

        let Some(payload) = message.audio_payload() else {
            return;
        };

        match decode_base64_pcm16(payload, self.config.output_sample_rate) {
            Ok(buffer) => {
                let placed = self.scheduler.schedule(&buffer);
                SessionCounters::bump(&self.counters.inbound_chunks_scheduled);
                debug!(
                    "Scheduled {:.3}s of model audio at {:.3}s",
                    placed.duration, placed.start_time
                );
            }
            Err(e) => {
                warn!("Dropping malformed audio chunk: {}", e);
                SessionCounters::bump(&self.counters.inbound_chunks_dropped);
            }
        }
    }

    /// Apply a terminal trigger: tear down, then publish the new state
    async fn finish(&mut self, trigger: Trigger, error: Option<SessionError>) {
        let Some(next) = self.state.next(trigger) else {
            return;
        };

        if let Some(e) = &error {
            error!("Session {} failed: {}", self.config.session_id, e);
            self.last_error = Some(e.user_message().to_string());
        }

        self.teardown().await;

        if next != self.state {
            self.transition(next);
        }
    }

    /// Release everything the current phase holds; idempotent
    async fn teardown(&mut self) {
        match std::mem::replace(&mut self.phase, Phase::Done) {
            Phase::Idle | Phase::Done => {}
            Phase::Acquiring(pending) => {
                // Anything it already acquired is released on drop
                drop(pending);
                debug!("Discarded pending media/connection setup");
            }
            Phase::Connecting(mut acquired) => {
                acquired.stream.release();
                acquired.transport.close().await;
            }
            Phase::Live(live) => {
                let LivePipeline {
                    mut stream,
                    transport,
                    events,
                    frames,
                    ticker,
                    audio,
                    audio_sender,
                } = live;

                stream.release();
                drop(frames);
                drop(ticker);
                drop(events);
                // A send may be stuck on a stalled connection
                drop(audio);
                audio_sender.abort();
                transport.close().await;
                info!("Capture stopped");
            }
        }

        self.scheduler.reset();
    }

    fn transition(&mut self, next: SessionState) {
        info!(
            "Session {}: {:?} -> {:?}",
            self.config.session_id, self.state, next
        );
        self.state = next;
        if next.is_terminal() && self.started_at.is_some() && self.ended_at.is_none() {
            self.ended_at = Some(Utc::now());
        }
        self.status.send_replace(SessionStatus {
            state: next,
            error: self.last_error.clone(),
            started_at: self.started_at,
            ended_at: self.ended_at,
        });
    }
}
