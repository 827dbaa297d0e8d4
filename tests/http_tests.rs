// Integration tests for the HTTP control API
//
// Exercises the router in-process with fake devices and a fake live
// endpoint; no sockets are opened.

mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{FakeDevices, FakeTransportFactory};
use live_assist::transport::TransportEvent;
use live_assist::video::VideoFrame;
use live_assist::{create_router, AppState, Config};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    state: AppState,
    factory: Arc<FakeTransportFactory>,
    recordings: TempDir,
}

impl TestApp {
    fn new() -> Result<Self> {
        let recordings = TempDir::new()?;
        let mut config = Config::default();
        config.audio.recordings_path = recordings.path().display().to_string();

        let factory = Arc::new(FakeTransportFactory::default());
        let devices = Arc::new(FakeDevices::granting(VideoFrame::new(0, 0, Vec::new())));
        let state = AppState::new(config, devices, factory.clone());

        Ok(Self {
            state,
            factory,
            recordings: recordings,
        })
    }

    async fn call(&self, request: Request<Body>) -> Result<(StatusCode, serde_json::Value)> {
        let response = create_router(self.state.clone()).oneshot(request).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        Ok((status, json))
    }

    async fn post(
        &self,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> Result<(StatusCode, serde_json::Value)> {
        let request = match body {
            Some(json) => Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))?,
            None => Request::post(uri).body(Body::empty())?,
        };
        self.call(request).await
    }

    async fn get(&self, uri: &str) -> Result<(StatusCode, serde_json::Value)> {
        self.call(Request::get(uri).body(Body::empty())?).await
    }
}

#[tokio::test]
async fn test_health_check() -> Result<()> {
    let app = TestApp::new()?;
    let response = create_router(app.state.clone())
        .oneshot(Request::get("/health").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    assert_eq!(&body[..], b"OK");

    Ok(())
}

#[tokio::test]
async fn test_session_lifecycle() -> Result<()> {
    let app = TestApp::new()?;

    let (status, started) = app.post("/live/sessions", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["state"], "connecting");
    let id = started["session_id"].as_str().unwrap().to_string();
    assert!(id.starts_with("live-"));

    // Let the fake endpoint open the session
    assert!(common::eventually(|| app.factory.event_sender().is_some()).await);
    app.factory.emit(TransportEvent::Open).await;
    let live = {
        let sessions = app.state.sessions.read().await;
        sessions.get(&id).cloned().unwrap()
    };
    live.wait_for(|s| s == live_assist::SessionState::Live).await;

    let (status, muted) = app
        .post(
            &format!("/live/sessions/{}/mute", id),
            Some(serde_json::json!({ "muted": true })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(muted["muted"], true);

    let (status, stats) = app.get(&format!("/live/sessions/{}/status", id)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["state"], "live");
    assert_eq!(stats["muted"], true);

    let (status, stopped) = app.post(&format!("/live/sessions/{}/stop", id), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stopped["state"], "closed");
    assert!(stopped["error"].is_null());

    // Stopped sessions are forgotten
    let (status, _) = app.get(&format!("/live/sessions/{}/status", id)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_reply_recording_is_created() -> Result<()> {
    let app = TestApp::new()?;

    let (_, started) = app.post("/live/sessions", None).await?;
    let id = started["session_id"].as_str().unwrap();

    let wav = app.recordings.path().join(format!("{}.wav", id));
    assert!(wav.exists());

    app.post(&format!("/live/sessions/{}/stop", id), None).await?;

    Ok(())
}

#[tokio::test]
async fn test_unknown_session_is_not_found() -> Result<()> {
    let app = TestApp::new()?;

    let (status, body) = app.get("/live/sessions/live-missing/status").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("live-missing"));

    let (status, _) = app.post("/live/sessions/live-missing/stop", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post(
            "/live/sessions/live-missing/mute",
            Some(serde_json::json!({ "muted": false })),
        )
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_remotely_closed_session_is_removed() -> Result<()> {
    let app = TestApp::new()?;

    let (_, started) = app.post("/live/sessions", None).await?;
    let id = started["session_id"].as_str().unwrap().to_string();

    assert!(common::eventually(|| app.factory.event_sender().is_some()).await);
    app.factory.emit(TransportEvent::Open).await;
    app.factory
        .emit(TransportEvent::Close(Some("session expired".to_string())))
        .await;

    let mut removed = false;
    for _ in 0..200 {
        if app.state.sessions.read().await.is_empty() {
            removed = true;
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert!(removed, "ended session should leave the session map");

    let (status, _) = app.get(&format!("/live/sessions/{}/status", id)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}
