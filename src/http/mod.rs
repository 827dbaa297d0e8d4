//! HTTP API server for external control (web client)
//!
//! This module provides a REST API for driving live sessions:
//! - POST /live/sessions - Start a new live session
//! - POST /live/sessions/:id/stop - Stop a session
//! - POST /live/sessions/:id/mute - Mute or unmute outbound audio
//! - GET /live/sessions/:id/status - Query session stats
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
