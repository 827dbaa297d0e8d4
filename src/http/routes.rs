use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session lifecycle
        .route("/live/sessions", post(handlers::start_session))
        .route(
            "/live/sessions/:session_id/stop",
            post(handlers::stop_session),
        )
        .route(
            "/live/sessions/:session_id/mute",
            post(handlers::mute_session),
        )
        // Session queries
        .route(
            "/live/sessions/:session_id/status",
            get(handlers::get_session_status),
        )
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        // The web client is served from a different origin
        .layer(CorsLayer::permissive())
        .with_state(state)
}
