use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An incoming message from a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Local ID, carried through log lines for this message.
    pub id: Uuid,
    /// Channel name (e.g. "telegram").
    pub channel: String,
    /// Platform-specific chat ID; the partition key for burst tracking.
    pub chat_id: String,
    /// Platform-specific user ID.
    pub sender_id: String,
    /// Human-readable sender name.
    pub sender_name: Option<String>,
    /// Platform message ID, used to thread replies.
    #[serde(default)]
    pub message_id: Option<i64>,
    pub content: MessageContent,
    pub timestamp: DateTime<Utc>,
}

impl IncomingMessage {
    /// Sender for log lines: the display name if known, else the raw ID.
    pub fn sender_label(&self) -> &str {
        self.sender_name.as_deref().unwrap_or(&self.sender_id)
    }
}

/// Payload of an incoming message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageContent {
    Text(String),
    Sticker {
        /// Handle used to re-send the sticker.
        file_id: String,
        /// Content-addressable identity, stable across bots and re-sends.
        file_unique_id: String,
    },
    Photo {
        /// Every resolution the platform attached for this one photo.
        variants: Vec<PhotoVariant>,
        caption: Option<String>,
    },
    /// Anything Chorus does not track (voice, documents, service messages).
    Unsupported,
}

impl MessageContent {
    /// The highest-resolution variant of a photo message.
    ///
    /// Ties go to the later variant, matching the smallest-first order
    /// Telegram uses.
    pub fn largest_photo(&self) -> Option<&PhotoVariant> {
        match self {
            Self::Photo { variants, .. } => variants.iter().max_by_key(|v| v.area()),
            _ => None,
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Sticker { .. } => "sticker",
            Self::Photo { .. } => "photo",
            Self::Unsupported => "unsupported",
        }
    }
}

/// One resolution of a photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoVariant {
    pub file_id: String,
    pub file_unique_id: String,
    pub width: u32,
    pub height: u32,
}

impl PhotoVariant {
    fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// An outgoing message to send back through a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Platform-specific chat ID to deliver into.
    pub chat_id: String,
    /// Platform message ID to reply to, if any.
    #[serde(default)]
    pub reply_to: Option<i64>,
    pub content: OutgoingContent,
}

impl OutgoingMessage {
    /// Plain text reply into a chat.
    pub fn text(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            reply_to: None,
            content: OutgoingContent::Text(text.into()),
        }
    }
}

/// Payload of an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutgoingContent {
    Text(String),
    Sticker {
        file_id: String,
    },
    Photo {
        file_id: String,
        caption: Option<String>,
    },
}
