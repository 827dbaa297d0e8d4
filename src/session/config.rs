use std::time::Duration;

use crate::audio::CaptureConfig;
use crate::config::Config;
use crate::media::MediaConstraints;
use crate::transport::messages::{
    Content, GenerationConfig, PrebuiltVoiceConfig, SetupMessage, SpeechConfig, VoiceConfig,
};

/// Configuration for a live session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Unique session identifier (e.g., "live-6f1c...")
    pub session_id: String,

    /// Devices requested on start()
    pub constraints: MediaConstraints,

    /// Microphone capture context (16kHz mono, 4096-sample frames)
    pub capture: CaptureConfig,

    /// Rate of inbound model audio
    pub output_sample_rate: u32,

    /// Period of the still-frame sampler
    pub frame_interval: Duration,

    /// JPEG quality factor in (0.0, 1.0]
    pub jpeg_quality: f32,

    /// Model name without the "models/" prefix
    pub model: String,

    pub voice: String,

    pub system_instruction: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl SessionConfig {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            session_id: format!("live-{}", uuid::Uuid::new_v4()),
            constraints: MediaConstraints {
                audio: true,
                video_width: cfg.video.width,
                video_height: cfg.video.height,
                audio_sample_rate: cfg.audio.input_sample_rate,
            },
            capture: CaptureConfig {
                sample_rate: cfg.audio.input_sample_rate,
                buffer_size: cfg.audio.buffer_size,
            },
            output_sample_rate: cfg.audio.output_sample_rate,
            frame_interval: Duration::from_millis(cfg.video.frame_interval_ms),
            jpeg_quality: cfg.video.jpeg_quality,
            model: cfg.live.model.clone(),
            voice: cfg.live.voice.clone(),
            system_instruction: cfg.live.system_instruction.clone(),
        }
    }

    /// First message sent on the live connection
    pub fn setup_message(&self) -> SetupMessage {
        let system_instruction = if self.system_instruction.is_empty() {
            None
        } else {
            Some(Content::text(self.system_instruction.clone()))
        };

        SetupMessage {
            model: format!("models/{}", self.model),
            generation_config: GenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: self.voice.clone(),
                        },
                    },
                }),
            },
            system_instruction,
        }
    }
}
