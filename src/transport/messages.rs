use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::audio::encode_pcm16;

/// Label of audio captured at the default 16kHz rate
pub const AUDIO_MIME_TYPE: &str = "audio/pcm;rate=16000";
pub const IMAGE_MIME_TYPE: &str = "image/jpeg";

/// One capture tick's worth of outbound media, before base64 wrapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundChunk {
    Audio { pcm: Vec<u8>, sample_rate: u32 },
    Image { jpeg: Vec<u8> },
}

impl OutboundChunk {
    /// Encode captured mono float samples as an audio chunk labelled with
    /// their capture rate
    pub fn audio(samples: &[f32], sample_rate: u32) -> Self {
        OutboundChunk::Audio {
            pcm: encode_pcm16(samples),
            sample_rate,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            OutboundChunk::Audio { .. } => "audio",
            OutboundChunk::Image { .. } => "image",
        }
    }

    pub fn to_realtime_input(&self) -> RealtimeInput {
        let engine = &base64::engine::general_purpose::STANDARD;
        let media = match self {
            OutboundChunk::Audio { pcm, sample_rate } => Blob {
                mime_type: format!("audio/pcm;rate={}", sample_rate),
                data: engine.encode(pcm),
            },
            OutboundChunk::Image { jpeg } => Blob {
                mime_type: IMAGE_MIME_TYPE.to_string(),
                data: engine.encode(jpeg),
            },
        };
        RealtimeInput { media }
    }
}

/// Base64 payload tagged with its MIME type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: String, // Base64-encoded bytes
}

/// Outbound realtime message: `{ "media": { "mimeType", "data" } }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeInput {
    pub media: Blob,
}

/// Client frames on the live WebSocket
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientMessage {
    Setup(SetupMessage),
    RealtimeInput(RealtimeInputChunks),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeInputChunks {
    pub media_chunks: Vec<Blob>,
}

impl From<RealtimeInput> for ClientMessage {
    fn from(input: RealtimeInput) -> Self {
        ClientMessage::RealtimeInput(RealtimeInputChunks {
            media_chunks: vec![input.media],
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupMessage {
    pub model: String,
    pub generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<SpeechConfig>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    pub voice_config: VoiceConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part {
                text: Some(text.into()),
                inline_data: None,
            }],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<Blob>,
}

/// Server event from the live endpoint
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMessage {
    #[serde(default)]
    pub setup_complete: Option<serde_json::Value>,
    #[serde(default)]
    pub server_content: Option<ServerContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerContent {
    #[serde(default)]
    pub model_turn: Option<Content>,
    #[serde(default)]
    pub turn_complete: bool,
    #[serde(default)]
    pub interrupted: bool,
}

impl ServerMessage {
    /// Base64 PCM from `serverContent.modelTurn.parts[0].inlineData.data`
    pub fn audio_payload(&self) -> Option<&str> {
        self.server_content
            .as_ref()?
            .model_turn
            .as_ref()?
            .parts
            .first()?
            .inline_data
            .as_ref()
            .map(|blob| blob.data.as_str())
    }

    pub fn is_setup_complete(&self) -> bool {
        self.setup_complete.is_some()
    }
}
