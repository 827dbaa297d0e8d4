use anyhow::Result;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::audio::{MonotonicClock, WavSink};
use crate::config::Config;
use crate::media::MediaDevices;
use crate::session::{LiveSession, SessionConfig, SessionPlatform};
use crate::transport::TransportFactory;
use crate::video::JpegFrameEncoder;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Active live sessions (session_id → session)
    pub sessions: Arc<RwLock<HashMap<String, LiveSession>>>,
    pub config: Arc<Config>,
    devices: Arc<dyn MediaDevices>,
    transport: Arc<dyn TransportFactory>,
}

impl AppState {
    pub fn new(
        config: Config,
        devices: Arc<dyn MediaDevices>,
        transport: Arc<dyn TransportFactory>,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            config: Arc::new(config),
            devices,
            transport,
        }
    }

    /// Build a new idle session whose reply audio goes to `<recordings_path>/<id>.wav`
    pub fn create_session(&self) -> Result<LiveSession> {
        let session_config = SessionConfig::from_config(&self.config);

        let output_path = PathBuf::from(&self.config.audio.recordings_path)
            .join(format!("{}.wav", session_config.session_id));
        let sink = WavSink::create(&output_path, session_config.output_sample_rate)?;

        let platform = SessionPlatform {
            devices: Arc::clone(&self.devices),
            transport: Arc::clone(&self.transport),
            image_encoder: Arc::new(JpegFrameEncoder),
            clock: Arc::new(MonotonicClock::new()),
            sink: Arc::new(sink),
        };

        Ok(LiveSession::spawn(session_config, platform))
    }

    /// Track `session` until it ends
    ///
    /// A session that reaches `Error` or `Closed` on its own is removed from
    /// the map. Once the last handle is gone its task exits and the reply
    /// recording is finalized.
    pub async fn register(&self, session: LiveSession) {
        let session_id = session.id().to_string();
        self.sessions
            .write()
            .await
            .insert(session_id.clone(), session.clone());

        let sessions = Arc::clone(&self.sessions);
        tokio::spawn(async move {
            let state = session.wait_for(|s| s.is_terminal()).await;
            drop(session);

            if sessions.write().await.remove(&session_id).is_some() {
                info!("Session {} ended ({:?}), removed", session_id, state);
            }
        });
    }
}
