use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use live_assist::{
    create_router, AppState, Config, FileMediaDevices, GeminiTransportFactory, JpegFrameEncoder,
    LiveSession, MonotonicClock, SessionConfig, SessionPlatform, SessionState, WavSink,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "live-assist", about = "Live audio/video assistant session pipeline")]
struct Cli {
    /// Config file (extension optional)
    #[arg(long, default_value = "config/live-assist")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP control API
    Serve {
        /// WAV file used as the microphone for every session
        #[arg(long)]
        audio: PathBuf,
        /// Still image used as the camera for every session
        #[arg(long)]
        image: PathBuf,
    },
    /// Run one live session and write the assistant's reply to a WAV file
    Run {
        #[arg(long)]
        audio: PathBuf,
        #[arg(long)]
        image: PathBuf,
        #[arg(long, default_value = "reply.wav")]
        output: PathBuf,
        /// Stop after this many seconds of being live
        #[arg(long, default_value_t = 30)]
        duration_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("Loaded config: {}", cfg.service.name);
    info!("Live model: {} (voice {})", cfg.live.model, cfg.live.voice);

    let transport = Arc::new(GeminiTransportFactory::new(
        cfg.live.endpoint.clone(),
        cfg.live.api_key()?,
    ));

    match cli.command {
        Command::Serve { audio, image } => {
            let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
            let devices = Arc::new(FileMediaDevices::new(audio, image));
            let state = AppState::new(cfg, devices, transport);

            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;
            info!("HTTP server listening on {}", addr);

            axum::serve(listener, create_router(state))
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await
                .context("HTTP server failed")?;
        }
        Command::Run {
            audio,
            image,
            output,
            duration_secs,
        } => {
            let session_config = SessionConfig::from_config(&cfg);
            let sink = Arc::new(WavSink::create(&output, session_config.output_sample_rate)?);

            let platform = SessionPlatform {
                devices: Arc::new(FileMediaDevices::new(audio, image)),
                transport,
                image_encoder: Arc::new(JpegFrameEncoder),
                clock: Arc::new(MonotonicClock::new()),
                sink: sink.clone(),
            };

            let session = LiveSession::spawn(session_config, platform);
            session.start().await?;

            let state = session
                .wait_for(|s| s == SessionState::Live || s.is_terminal())
                .await;

            if state == SessionState::Live {
                info!("Session live for up to {}s (Ctrl-C to stop)", duration_secs);
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(duration_secs)) => {}
                    _ = tokio::signal::ctrl_c() => {}
                    _ = session.wait_for(|s| s.is_terminal()) => {}
                }
            }

            let stats = session.stop().await;
            if let Some(error) = &stats.error {
                warn!("Session ended with error: {}", error);
            }
            info!(
                "Sent {} audio chunks ({} dropped), {} video frames; scheduled {} reply chunks",
                stats.audio_chunks_sent,
                stats.audio_chunks_dropped,
                stats.image_frames_sent,
                stats.inbound_chunks_scheduled
            );

            sink.finish()?;
            info!(
                "Reply audio written to {} ({:.1}s)",
                sink.path().display(),
                sink.duration_secs()
            );
        }
    }

    Ok(())
}
