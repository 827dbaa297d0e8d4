use anyhow::{ensure, Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub live: LiveConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub video: VideoConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "live-assist".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

/// Remote live endpoint and model setup
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    pub endpoint: String,
    pub model: String,
    pub voice: String,
    pub system_instruction: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            endpoint: "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent".to_string(),
            model: "gemini-2.5-flash-native-audio-preview-09-2025".to_string(),
            voice: "Fenrir".to_string(),
            system_instruction: "You are a video conference participant. You can see what the user shows you via their camera and hear them. Be helpful, professional, and brief.".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
        }
    }
}

impl LiveConfig {
    pub fn api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env)
            .with_context(|| format!("Environment variable {} is not set", self.api_key_env))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub input_sample_rate: u32,
    pub output_sample_rate: u32,
    pub buffer_size: usize,
    /// Where the HTTP service writes each session's reply audio
    pub recordings_path: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            input_sample_rate: 16000,
            output_sample_rate: 24000,
            buffer_size: 4096,
            recordings_path: "recordings".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub width: u32,
    pub height: u32,
    pub frame_interval_ms: u64,
    pub jpeg_quality: f32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            frame_interval_ms: 1000,
            jpeg_quality: 0.5,
        }
    }
}

impl Config {
    /// Load `path` (any format the `config` crate knows), then apply
    /// `LIVE_ASSIST__SECTION__KEY` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("LIVE_ASSIST")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let cfg: Config = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the capture and sampling pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.audio.input_sample_rate > 0,
            "audio.input_sample_rate must be positive"
        );
        ensure!(
            self.audio.output_sample_rate > 0,
            "audio.output_sample_rate must be positive"
        );
        ensure!(self.audio.buffer_size > 0, "audio.buffer_size must be positive");
        ensure!(
            self.video.frame_interval_ms > 0,
            "video.frame_interval_ms must be positive"
        );
        ensure!(
            self.video.jpeg_quality > 0.0 && self.video.jpeg_quality <= 1.0,
            "video.jpeg_quality must be in (0.0, 1.0], got {}",
            self.video.jpeg_quality
        );
        Ok(())
    }
}
