use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use super::messages::{ClientMessage, RealtimeInput, ServerMessage, SetupMessage};
use super::{Transport, TransportEvent, TransportFactory};
use crate::error::ConnectionError;

/// Opens live sessions against the Gemini bidirectional streaming endpoint
pub struct GeminiTransportFactory {
    endpoint: String,
    api_key: String,
}

impl GeminiTransportFactory {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

enum Outgoing {
    Frame(String),
    Close,
}

struct GeminiTransport {
    outbound: mpsc::Sender<Outgoing>,
    closed: AtomicBool,
    writer: JoinHandle<()>,
    reader: JoinHandle<()>,
}

#[async_trait]
impl Transport for GeminiTransport {
    async fn send(&self, input: RealtimeInput) -> Result<(), ConnectionError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ConnectionError::Closed);
        }

        let payload = serde_json::to_string(&ClientMessage::from(input))
            .map_err(|e| ConnectionError::Protocol(e.to_string()))?;

        self.outbound
            .send(Outgoing::Frame(payload))
            .await
            .map_err(|_| ConnectionError::Closed)
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("Closing live connection");

        // Nothing more is read after close
        self.reader.abort();
        if self.outbound.try_send(Outgoing::Close).is_err() {
            warn!("Live writer is backed up, dropping connection without close frame");
            self.writer.abort();
        }
    }
}

impl Drop for GeminiTransport {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Turn one inbound frame into a session event
fn parse_server_frame(payload: &[u8]) -> Option<TransportEvent> {
    match serde_json::from_slice::<ServerMessage>(payload) {
        Ok(message) if message.is_setup_complete() => Some(TransportEvent::Open),
        Ok(message) => Some(TransportEvent::Message(message)),
        Err(e) => {
            warn!("Failed to parse live server message: {}", e);
            None
        }
    }
}

#[async_trait]
impl TransportFactory for GeminiTransportFactory {
    async fn connect(
        &self,
        setup: &SetupMessage,
    ) -> Result<(Arc<dyn Transport>, mpsc::Receiver<TransportEvent>), ConnectionError> {
        info!("Connecting to live endpoint {} (model={})", self.endpoint, setup.model);

        let url = format!("{}?key={}", self.endpoint, self.api_key);
        let (ws, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| ConnectionError::Handshake(e.to_string()))?;

        let (mut sink, mut stream) = ws.split();

        let setup_frame = serde_json::to_string(&ClientMessage::Setup(setup.clone()))
            .map_err(|e| ConnectionError::Protocol(e.to_string()))?;
        sink.send(Message::Text(setup_frame))
            .await
            .map_err(|e| ConnectionError::Handshake(e.to_string()))?;

        info!("Live connection established, awaiting setup completion");

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<Outgoing>(64);
        let (event_tx, event_rx) = mpsc::channel::<TransportEvent>(64);

        let writer = tokio::spawn(async move {
            while let Some(outgoing) = outbound_rx.recv().await {
                match outgoing {
                    Outgoing::Frame(text) => {
                        if let Err(e) = sink.send(Message::Text(text)).await {
                            error!("Failed to write live frame: {}", e);
                            break;
                        }
                    }
                    Outgoing::Close => {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
            let _ = sink.close().await;
            debug!("Live writer task stopped");
        });

        let reader = tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                let event = match frame {
                    Ok(Message::Text(text)) => parse_server_frame(text.as_bytes()),
                    Ok(Message::Binary(bytes)) => parse_server_frame(&bytes),
                    Ok(Message::Close(close)) => {
                        let reason = close.map(|f| f.reason.to_string());
                        let _ = event_tx.send(TransportEvent::Close(reason)).await;
                        debug!("Live reader task stopped (remote close)");
                        return;
                    }
                    Ok(_) => None,
                    Err(e) => {
                        let _ = event_tx.send(TransportEvent::Error(e.to_string())).await;
                        debug!("Live reader task stopped (error)");
                        return;
                    }
                };

                if let Some(event) = event {
                    if event_tx.send(event).await.is_err() {
                        break;
                    }
                }
            }

            let _ = event_tx.send(TransportEvent::Close(None)).await;
            debug!("Live reader task stopped");
        });

        let transport = GeminiTransport {
            outbound: outbound_tx,
            closed: AtomicBool::new(false),
            writer,
            reader,
        };

        Ok((Arc::new(transport), event_rx))
    }
}
