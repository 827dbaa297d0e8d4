use super::state::AppState;
use crate::session::{SessionState, SessionStats};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: String,
    pub state: SessionState,
}

#[derive(Debug, Deserialize)]
pub struct MuteRequest {
    pub muted: bool,
}

#[derive(Debug, Serialize)]
pub struct MuteResponse {
    pub session_id: String,
    pub muted: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn not_found(session_id: &str) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Session {} not found", session_id),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /live/sessions
/// Start a new live session
pub async fn start_session(State(state): State<AppState>) -> impl IntoResponse {
    let session = match state.create_session() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create session: {:#}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to create session: {}", e),
                }),
            )
                .into_response();
        }
    };

    let session_id = session.id().to_string();
    info!("Starting live session: {}", session_id);

    if let Err(e) = session.start().await {
        error!("Failed to start session: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Failed to start session: {}", e),
            }),
        )
            .into_response();
    }

    let current = session.state();
    state.register(session).await;

    (
        StatusCode::OK,
        Json(StartSessionResponse {
            session_id,
            state: current,
        }),
    )
        .into_response()
}

/// POST /live/sessions/:session_id/stop
/// Stop a session and return its final stats
pub async fn stop_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    info!("Stopping live session: {}", session_id);

    let session = {
        let mut sessions = state.sessions.write().await;
        sessions.remove(&session_id)
    };

    match session {
        Some(session) => {
            let stats: SessionStats = session.stop().await;
            (StatusCode::OK, Json(stats)).into_response()
        }
        None => not_found(&session_id),
    }
}

/// POST /live/sessions/:session_id/mute
/// Gate outbound audio
pub async fn mute_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<MuteRequest>,
) -> impl IntoResponse {
    let sessions = state.sessions.read().await;

    match sessions.get(&session_id) {
        Some(session) => {
            session.set_muted(req.muted);
            (
                StatusCode::OK,
                Json(MuteResponse {
                    session_id: session_id.clone(),
                    muted: session.is_muted(),
                }),
            )
                .into_response()
        }
        None => not_found(&session_id),
    }
}

/// GET /live/sessions/:session_id/status
pub async fn get_session_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let sessions = state.sessions.read().await;

    match sessions.get(&session_id) {
        Some(session) => (StatusCode::OK, Json(session.stats())).into_response(),
        None => not_found(&session_id),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
