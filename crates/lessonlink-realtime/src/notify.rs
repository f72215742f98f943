//! Notification hook.
//!
//! The connection never touches OS notification APIs. Messages that deserve a
//! user-facing notice are turned into a [`Notice`] and handed to an optional
//! [`NotificationSink`] supplied by the embedding application.

use serde_json::Value;
use tracing::info;

use crate::envelope::{InboundMessage, MessageKind};

/// A user-facing notice derived from an inbound message.
#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    /// Source message kind.
    pub kind: MessageKind,
    /// Short headline.
    pub title: String,
    /// Detail line.
    pub body: String,
    /// The full message payload.
    pub payload: Value,
}

impl Notice {
    /// Build a notice for message kinds that warrant one.
    pub fn from_message(message: &InboundMessage) -> Option<Self> {
        let payload = message.payload();
        let (title, body) = match message.kind() {
            MessageKind::AchievementUnlocked => {
                let name = first_str(
                    payload,
                    &[&["achievement", "name"], &["achievement", "title"], &["name"], &["title"]],
                )
                .unwrap_or("New achievement");
                ("Achievement unlocked!".to_owned(), name.to_owned())
            }
            MessageKind::MasteryUpdate => {
                let body = if let Some(text) = first_str(payload, &[&["message"]]) {
                    text.to_owned()
                } else {
                    let skill = first_str(payload, &[&["skill"], &["concept"]]).unwrap_or("Skill");
                    match payload.get("mastery_level").or_else(|| payload.get("level")) {
                        Some(level) => format!("{skill} mastery is now {level}"),
                        None => format!("{skill} mastery updated"),
                    }
                };
                ("Mastery update".to_owned(), body)
            }
            _ => return None,
        };
        Some(Self {
            kind: message.kind(),
            title,
            body,
            payload: payload.clone(),
        })
    }
}

/// Receives notices; implemented by the embedding application.
pub trait NotificationSink: Send + Sync {
    /// Surface one notice.
    fn notify(&self, notice: &Notice);
}

/// Sink that only logs notices.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn notify(&self, notice: &Notice) {
        info!(title = %notice.title, body = %notice.body, "notice");
    }
}

fn first_str<'a>(payload: &'a Value, paths: &[&[&str]]) -> Option<&'a str> {
    paths.iter().find_map(|path| {
        path.iter()
            .try_fold(payload, |value, key| value.get(*key))
            .and_then(Value::as_str)
    })
}
