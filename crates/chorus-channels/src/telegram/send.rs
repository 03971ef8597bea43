//! Message sending: text, stickers, photos, and command registration.

use super::TelegramChannel;
use chorus_core::{error::ChorusError, message::OutgoingContent};
use tracing::{info, warn};

/// Build the Bot API method and JSON body for one outgoing message.
///
/// Text goes out without a parse mode so echoes are byte-for-byte what the
/// users sent. Stickers and photos are re-sent by `file_id`, no upload.
pub(crate) fn build_request(
    chat_id: i64,
    reply_to: Option<i64>,
    content: &OutgoingContent,
) -> (&'static str, serde_json::Value) {
    let (method, mut body) = match content {
        OutgoingContent::Text(text) => (
            "sendMessage",
            serde_json::json!({
                "chat_id": chat_id,
                "text": text,
            }),
        ),
        OutgoingContent::Sticker { file_id } => (
            "sendSticker",
            serde_json::json!({
                "chat_id": chat_id,
                "sticker": file_id,
            }),
        ),
        OutgoingContent::Photo { file_id, caption } => {
            let mut body = serde_json::json!({
                "chat_id": chat_id,
                "photo": file_id,
            });
            if let Some(caption) = caption {
                body["caption"] = serde_json::Value::from(caption.as_str());
            }
            ("sendPhoto", body)
        }
    };

    if let Some(message_id) = reply_to {
        body["reply_parameters"] = serde_json::json!({
            "message_id": message_id,
            "allow_sending_without_reply": true,
        });
    }

    (method, body)
}

impl TelegramChannel {
    /// Send one message of any supported kind to a chat.
    pub(crate) async fn send_content(
        &self,
        chat_id: i64,
        reply_to: Option<i64>,
        content: &OutgoingContent,
    ) -> Result<(), ChorusError> {
        let (method, body) = build_request(chat_id, reply_to, content);
        let url = format!("{}/{method}", self.base_url);

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChorusError::Channel(format!("telegram {method} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            return Err(ChorusError::Channel(format!(
                "telegram {method} failed ({status}): {error_text}"
            )));
        }

        Ok(())
    }

    /// Register bot commands with Telegram so users see an autocomplete menu.
    /// Best-effort: logs failures but does not propagate errors.
    pub(crate) async fn register_commands(&self) {
        let commands = serde_json::json!({
            "commands": [
                { "command": "start", "description": "What this bot does" },
                { "command": "status", "description": "Uptime, threshold, and tracked content" },
            ]
        });

        let url = format!("{}/setMyCommands", self.base_url);
        match self.client.post(&url).json(&commands).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("registered Telegram bot commands");
            }
            Ok(resp) => {
                let body = resp.text().await.unwrap_or_default();
                warn!("failed to register Telegram bot commands: {body}");
            }
            Err(e) => {
                warn!("failed to register Telegram bot commands: {e}");
            }
        }
    }
}
