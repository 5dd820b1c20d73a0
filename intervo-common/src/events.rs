//! Real-time wire protocol
//!
//! Every frame exchanged over the interview WebSocket is a JSON object of the
//! shape `{"type": "<event name>", "payload": {...}}`. Inbound and outbound
//! events are closed tagged unions so dispatch is exhaustive: an unknown
//! event name fails deserialization instead of being silently dropped.

use crate::models::InterviewStep;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable error codes surfaced to clients in `server:error`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Handshake credential missing, malformed, or unknown user
    AuthError,
    /// Background setup pipeline failed; session is FAILED
    InterviewSetupFailed,
    /// Generated questions could not be persisted
    QuestionProcessingFailed,
    /// Video blob could not be analyzed or persisted
    EmotionAnalysisFailed,
    /// Answer persistence or evaluation failed mid-interview
    AnswerProcessingFailed,
    /// Session missing or not owned by the authenticated user
    UnauthorizedOrNotFound,
}

/// Kind of recorded media uploaded in chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Video,
    Audio,
}

/// Client → server events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Bind this connection to a session's room
    #[serde(rename = "client:join-room")]
    JoinRoom { session_id: Uuid },

    /// Client UI is ready; server replies with the current question
    #[serde(rename = "client:ready")]
    Ready { session_id: Uuid },

    /// Submit an answer for a step
    #[serde(rename = "client:submit-answer")]
    SubmitAnswer {
        step_id: Uuid,
        answer: String,
        duration: i64,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
    },

    /// Best-effort persistence of client-reported elapsed time
    #[serde(rename = "client:submit-elapsedSec")]
    SubmitElapsedSec { session_id: Uuid, elapsed_sec: i64 },

    /// One ordered binary chunk of a media recording (base64)
    #[serde(rename = "client:upload-chunk")]
    UploadChunk { index: u32, chunk: String },

    /// All chunks sent; assemble and analyze
    #[serde(rename = "client:upload-finish")]
    UploadFinish {
        #[serde(rename = "type")]
        kind: UploadKind,
        step_id: Uuid,
    },

    /// Application-level heartbeat, feeds the TTL-refresh throttle
    #[serde(rename = "client:ping")]
    Ping,
}

/// Server → client events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    #[serde(rename = "server:room-joined")]
    RoomJoined { session_id: Uuid },

    /// Question set is persisted and the interview can start. Broadcast when
    /// generation finishes; unicast as a replay to late joiners, in which
    /// case `answered_steps` carries what was already answered.
    #[serde(rename = "server:questions-ready")]
    QuestionsReady {
        session_id: Uuid,
        elapsed_sec: i64,
        steps: Vec<InterviewStep>,
        answered_steps: Vec<InterviewStep>,
    },

    #[serde(rename = "server:next-question")]
    NextQuestion {
        step: InterviewStep,
        is_follow_up: bool,
        audio_base64: String,
        stt_token: String,
    },

    #[serde(rename = "server:question-audio-ready")]
    QuestionAudioReady { step_id: Uuid, audio_base64: String },

    /// Last main question resolved; session evaluation runs afterwards
    #[serde(rename = "server:interview-finished")]
    InterviewFinished { session_id: Uuid },

    /// Final session feedback persisted
    #[serde(rename = "server:evaluation-finished")]
    EvaluationFinished { session_id: Uuid },

    #[serde(rename = "server:error")]
    Error { code: ErrorCode, message: String },
}

impl ServerEvent {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ServerEvent::Error { code, message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_room_wire_format() {
        let id = Uuid::new_v4();
        let json = format!(r#"{{"type":"client:join-room","payload":{{"sessionId":"{}"}}}}"#, id);
        let event: ClientEvent = serde_json::from_str(&json).unwrap();
        match event {
            ClientEvent::JoinRoom { session_id } => assert_eq!(session_id, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn upload_finish_uses_type_field() {
        let id = Uuid::new_v4();
        let json = format!(
            r#"{{"type":"client:upload-finish","payload":{{"type":"video","stepId":"{}"}}}}"#,
            id
        );
        let event: ClientEvent = serde_json::from_str(&json).unwrap();
        match event {
            ClientEvent::UploadFinish { kind, step_id } => {
                assert_eq!(kind, UploadKind::Video);
                assert_eq!(step_id, id);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn unknown_event_name_is_rejected() {
        let json = r#"{"type":"client:made-up","payload":{}}"#;
        assert!(serde_json::from_str::<ClientEvent>(json).is_err());
    }

    #[test]
    fn error_event_carries_stable_code() {
        let event = ServerEvent::error(ErrorCode::InterviewSetupFailed, "boom");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"server:error""#));
        assert!(json.contains(r#""code":"INTERVIEW_SETUP_FAILED""#));
    }
}
