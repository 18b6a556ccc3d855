// Wire-format tests for the agent transport messages

use base64::Engine;
use viva::agent::messages::{
    AgentEventMessage, AudioFrameMessage, CompletionReply, CompletionRequest,
    CompletionTurnMessage, SessionOpenAck, SessionOpenRequest,
};
use viva::transcript::Speaker;

#[test]
fn test_audio_frame_serialization() {
    let msg = AudioFrameMessage {
        session_id: "iv-test".to_string(),
        sequence: 0,
        pcm: base64::engine::general_purpose::STANDARD.encode([0u8; 100]),
        sample_rate: 16000,
        timestamp: "2026-08-05T10:30:00Z".to_string(),
        final_frame: false,
    };

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("iv-test"));
    assert!(json.contains("16000"));
    assert!(json.contains("\"final\":false"));
    assert!(json.contains("\"sequence\":0"));

    let deserialized: AudioFrameMessage = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized.session_id, "iv-test");
    assert_eq!(deserialized.sample_rate, 16000);
    assert!(!deserialized.final_frame);
}

#[test]
fn test_audio_frame_final_marker() {
    let msg = AudioFrameMessage {
        session_id: "iv-test".to_string(),
        sequence: 10,
        pcm: String::new(), // Empty for final marker
        sample_rate: 16000,
        timestamp: "2026-08-05T10:30:00Z".to_string(),
        final_frame: true,
    };

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"final\":true"));

    let deserialized: AudioFrameMessage = serde_json::from_str(&json).unwrap();
    assert!(deserialized.final_frame);
    assert!(deserialized.pcm.is_empty());
}

#[test]
fn test_event_union_deserialization() {
    let json = r#"{"type":"user_transcript","text":"介绍一下"}"#;
    let event: AgentEventMessage = serde_json::from_str(json).unwrap();
    assert_eq!(
        event,
        AgentEventMessage::UserTranscript {
            text: "介绍一下".to_string()
        }
    );

    let json = r#"{"type":"turn_complete"}"#;
    let event: AgentEventMessage = serde_json::from_str(json).unwrap();
    assert_eq!(event, AgentEventMessage::TurnComplete);

    let json = r#"{"type":"interrupted"}"#;
    let event: AgentEventMessage = serde_json::from_str(json).unwrap();
    assert_eq!(event, AgentEventMessage::Interrupted);

    let json = r#"{"type":"error","reason":"quota exceeded"}"#;
    let event: AgentEventMessage = serde_json::from_str(json).unwrap();
    assert_eq!(
        event,
        AgentEventMessage::Error {
            reason: "quota exceeded".to_string()
        }
    );
}

#[test]
fn test_audio_chunk_event_round_trip() {
    let pcm = base64::engine::general_purpose::STANDARD.encode([1u8, 0, 254, 255]);
    let event = AgentEventMessage::AudioChunk {
        pcm: pcm.clone(),
        sample_rate: 24000,
    };

    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("\"type\":\"audio_chunk\""));
    assert!(json.contains("24000"));

    let back: AgentEventMessage = serde_json::from_str(&json).unwrap();
    assert_eq!(back, AgentEventMessage::AudioChunk { pcm, sample_rate: 24000 });
}

#[test]
fn test_unknown_event_type_is_rejected() {
    let json = r#"{"type":"hologram","text":"?"}"#;
    assert!(serde_json::from_str::<AgentEventMessage>(json).is_err());
}

#[test]
fn test_session_open_handshake_messages() {
    let request = SessionOpenRequest {
        session_id: "iv-1".to_string(),
        system_instruction: "你是面试官".to_string(),
        output_modality: "audio".to_string(),
        voice: "Puck".to_string(),
        input_sample_rate: 16000,
    };
    let json = serde_json::to_string(&request).unwrap();
    assert!(json.contains("\"voice\":\"Puck\""));
    assert!(json.contains("\"output_modality\":\"audio\""));

    let ack: SessionOpenAck = serde_json::from_str(r#"{"accepted":true}"#).unwrap();
    assert!(ack.accepted);
    assert!(ack.reason.is_none());

    let ack: SessionOpenAck =
        serde_json::from_str(r#"{"accepted":false,"reason":"bad voice"}"#).unwrap();
    assert!(!ack.accepted);
    assert_eq!(ack.reason.as_deref(), Some("bad voice"));
}

#[test]
fn test_completion_request_keeps_turn_order() {
    let request = CompletionRequest {
        system_instruction: "你是面试官".to_string(),
        turns: vec![
            CompletionTurnMessage {
                speaker: Speaker::Agent,
                text: "请自我介绍。".to_string(),
            },
            CompletionTurnMessage {
                speaker: Speaker::User,
                text: "我有5年经验".to_string(),
            },
        ],
    };

    let json = serde_json::to_string(&request).unwrap();
    let back: CompletionRequest = serde_json::from_str(&json).unwrap();
    assert_eq!(back.turns.len(), 2);
    assert_eq!(back.turns[0].speaker, Speaker::Agent);
    assert_eq!(back.turns[1].speaker, Speaker::User);
    assert!(json.contains("\"speaker\":\"agent\""));
    assert!(json.contains("\"speaker\":\"user\""));
}

#[test]
fn test_completion_reply_variants() {
    let reply: CompletionReply = serde_json::from_str(r#"{"text":"好的。"}"#).unwrap();
    assert_eq!(reply.text.as_deref(), Some("好的。"));
    assert!(reply.error.is_none());

    let reply: CompletionReply = serde_json::from_str(r#"{"error":"overloaded"}"#).unwrap();
    assert!(reply.text.is_none());
    assert_eq!(reply.error.as_deref(), Some("overloaded"));
}
