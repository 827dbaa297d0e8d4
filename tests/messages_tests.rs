// Integration tests for live endpoint wire messages
//
// Pins the JSON shape of outbound media and setup frames and the
// extraction of model audio from server events.

use anyhow::Result;
use base64::Engine;
use live_assist::session::SessionConfig;
use live_assist::transport::messages::{ClientMessage, AUDIO_MIME_TYPE, IMAGE_MIME_TYPE};
use live_assist::transport::{OutboundChunk, ServerMessage};
use serde_json::json;

#[test]
fn test_audio_chunk_wire_shape() -> Result<()> {
    let chunk = OutboundChunk::audio(&[0.0, 1.0, -1.0], 16000);
    assert_eq!(chunk.kind(), "audio");

    let value = serde_json::to_value(chunk.to_realtime_input())?;
    assert_eq!(value["media"]["mimeType"], AUDIO_MIME_TYPE);

    let data = value["media"]["data"].as_str().unwrap();
    let bytes = base64::engine::general_purpose::STANDARD.decode(data)?;
    assert_eq!(bytes, vec![0x00, 0x00, 0xFF, 0x7F, 0x00, 0x80]);

    Ok(())
}

#[test]
fn test_audio_label_follows_capture_rate() -> Result<()> {
    let chunk = OutboundChunk::audio(&[0.25; 8], 8000);
    let value = serde_json::to_value(chunk.to_realtime_input())?;

    assert_eq!(value["media"]["mimeType"], "audio/pcm;rate=8000");

    Ok(())
}

#[test]
fn test_image_chunk_wire_shape() -> Result<()> {
    let chunk = OutboundChunk::Image {
        jpeg: vec![0xFF, 0xD8, 0xFF, 0xD9],
    };
    assert_eq!(chunk.kind(), "image");

    let value = serde_json::to_value(chunk.to_realtime_input())?;
    assert_eq!(
        value,
        json!({ "media": { "mimeType": IMAGE_MIME_TYPE, "data": "/9j/2Q==" } })
    );

    Ok(())
}

#[test]
fn test_realtime_input_envelope() -> Result<()> {
    let input = OutboundChunk::audio(&[0.0], 16000).to_realtime_input();
    let value = serde_json::to_value(ClientMessage::from(input))?;

    let chunks = value["realtimeInput"]["mediaChunks"].as_array().unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0]["mimeType"], "audio/pcm;rate=16000");
    assert_eq!(chunks[0]["data"], "AAA=");

    Ok(())
}

#[test]
fn test_setup_envelope() -> Result<()> {
    let setup = SessionConfig::default().setup_message();
    let value = serde_json::to_value(ClientMessage::Setup(setup))?;

    let setup = &value["setup"];
    assert!(setup["model"].as_str().unwrap().starts_with("models/"));
    assert_eq!(setup["generationConfig"]["responseModalities"], json!(["AUDIO"]));
    assert_eq!(
        setup["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]
            ["voiceName"],
        "Fenrir"
    );
    assert!(setup["systemInstruction"]["parts"][0]["text"].is_string());

    Ok(())
}

#[test]
fn test_model_audio_is_extracted() -> Result<()> {
    let message: ServerMessage = serde_json::from_value(json!({
        "serverContent": {
            "modelTurn": {
                "role": "model",
                "parts": [
                    { "inlineData": { "mimeType": "audio/pcm;rate=24000", "data": "AAABAA==" } },
                    { "text": "ignored" }
                ]
            }
        }
    }))?;

    assert_eq!(message.audio_payload(), Some("AAABAA=="));
    assert!(!message.is_setup_complete());

    Ok(())
}

#[test]
fn test_events_without_audio() -> Result<()> {
    let cases = [
        json!({ "setupComplete": {} }),
        json!({ "serverContent": { "turnComplete": true } }),
        json!({ "serverContent": { "modelTurn": { "parts": [] } } }),
        json!({ "serverContent": { "modelTurn": { "parts": [{ "text": "hi" }] } } }),
        json!({ "serverContent": { "interrupted": true } }),
    ];

    for case in cases {
        let message: ServerMessage = serde_json::from_value(case.clone())?;
        assert_eq!(message.audio_payload(), None, "case {}", case);
    }

    let interrupted: ServerMessage =
        serde_json::from_value(json!({ "serverContent": { "interrupted": true } }))?;
    assert!(interrupted.server_content.unwrap().interrupted);

    Ok(())
}
