//! Wire envelope: `{ "type": ..., ...payload }` JSON objects in both directions.

use serde_json::{Map, Value};

use crate::error::EnvelopeError;

/// Inbound message types the platform is known to send.
///
/// The set is open: anything else parses as [`MessageKind::Other`] and is
/// still dispatched to listeners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Server greeting after the socket opens.
    ConnectionEstablished,
    /// A skill's mastery level changed.
    MasteryUpdate,
    /// The student earned an achievement.
    AchievementUnlocked,
    /// Lesson or course progress changed.
    ProgressUpdate,
    /// A quiz attempt was graded.
    QuizCompleted,
    /// Leaderboard standings changed.
    LeaderboardUpdate,
    /// Reply to a keepalive ping.
    Pong,
    /// Any type not listed above.
    Other,
}

impl MessageKind {
    /// Classify a `type` field value.
    pub fn from_type(message_type: &str) -> Self {
        match message_type {
            "connection_established" => Self::ConnectionEstablished,
            "mastery_update" => Self::MasteryUpdate,
            "achievement_unlocked" => Self::AchievementUnlocked,
            "progress_update" => Self::ProgressUpdate,
            "quiz_completed" => Self::QuizCompleted,
            "leaderboard_update" => Self::LeaderboardUpdate,
            "pong" => Self::Pong,
            _ => Self::Other,
        }
    }

    /// Wire name, `None` for [`MessageKind::Other`].
    pub fn as_str(self) -> Option<&'static str> {
        match self {
            Self::ConnectionEstablished => Some("connection_established"),
            Self::MasteryUpdate => Some("mastery_update"),
            Self::AchievementUnlocked => Some("achievement_unlocked"),
            Self::ProgressUpdate => Some("progress_update"),
            Self::QuizCompleted => Some("quiz_completed"),
            Self::LeaderboardUpdate => Some("leaderboard_update"),
            Self::Pong => Some("pong"),
            Self::Other => None,
        }
    }
}

/// A parsed inbound frame.
///
/// The payload is the whole JSON object, `type` included, exactly as received.
#[derive(Clone, Debug, PartialEq)]
pub struct InboundMessage {
    message_type: String,
    payload: Value,
}

impl InboundMessage {
    /// Parse a raw text frame.
    pub fn parse(raw: &str) -> Result<Self, EnvelopeError> {
        let payload: Value = serde_json::from_str(raw)?;
        let object = payload.as_object().ok_or(EnvelopeError::NotAnObject)?;
        let message_type = object
            .get("type")
            .and_then(Value::as_str)
            .ok_or(EnvelopeError::MissingType)?
            .to_owned();
        Ok(Self {
            message_type,
            payload,
        })
    }

    /// The `type` field.
    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    /// Classified type.
    pub fn kind(&self) -> MessageKind {
        MessageKind::from_type(&self.message_type)
    }

    /// The full JSON object.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Consume and return the full JSON object.
    pub fn into_payload(self) -> Value {
        self.payload
    }
}

/// Build an outbound frame `{type, ...data}`.
///
/// Object `data` is flattened next to `type`; the explicit `message_type`
/// wins over any `type` key inside `data`. `null` adds nothing, and any other
/// value is carried under a `data` key.
pub fn encode_outbound(message_type: &str, data: Value) -> Result<String, EnvelopeError> {
    let mut frame = Map::new();
    match data {
        Value::Object(fields) => frame.extend(fields),
        Value::Null => {}
        other => {
            let _ = frame.insert("data".to_owned(), other);
        }
    }
    let _ = frame.insert("type".to_owned(), Value::String(message_type.to_owned()));
    Ok(serde_json::to_string(&Value::Object(frame))?)
}
