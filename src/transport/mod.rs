//! Duplex connection to the live AI endpoint
//!
//! The session talks to the remote service only through [`Transport`] (send
//! side) and the [`TransportEvent`] channel returned by
//! [`TransportFactory::connect`] (receive side and lifecycle).

mod gemini;
pub mod messages;

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::ConnectionError;

pub use gemini::GeminiTransportFactory;
pub use messages::{Blob, OutboundChunk, RealtimeInput, ServerMessage, SetupMessage};

/// Lifecycle and data events from the remote endpoint
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// Remote side is ready for realtime input
    Open,
    Message(ServerMessage),
    Error(String),
    /// Remote side closed; carries the close reason if one was given
    Close(Option<String>),
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, input: RealtimeInput) -> Result<(), ConnectionError>;

    /// Close the connection; safe to call more than once
    async fn close(&self);
}

#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn connect(
        &self,
        setup: &SetupMessage,
    ) -> Result<(Arc<dyn Transport>, mpsc::Receiver<TransportEvent>), ConnectionError>;
}
