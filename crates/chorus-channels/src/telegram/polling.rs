//! Long-polling update loop and Channel trait implementation.

use super::types::{TgMessage, TgResponse, TgUpdate};
use super::TelegramChannel;
use async_trait::async_trait;
use chorus_core::{
    error::ChorusError,
    message::{IncomingMessage, MessageContent, OutgoingMessage, PhotoVariant},
    traits::Channel,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<mpsc::Receiver<IncomingMessage>, ChorusError> {
        self.register_commands().await;

        let (tx, rx) = mpsc::channel(64);
        let client = self.client.clone();
        let base_url = self.base_url.clone();
        let allowed_chats = self.config.allowed_chats.clone();
        let last_update_id = self.last_update_id.clone();

        info!("Telegram channel starting long polling...");

        let handle = tokio::spawn(async move {
            let mut backoff_secs: u64 = 1;

            loop {
                let last = last_update_id.lock().await;
                let offset = last.map(|id| id + 1);
                drop(last);

                let mut url = format!("{base_url}/getUpdates?timeout=30");
                if let Some(off) = offset {
                    url.push_str(&format!("&offset={off}"));
                }

                let resp = match client
                    .get(&url)
                    .timeout(std::time::Duration::from_secs(35))
                    .send()
                    .await
                {
                    Ok(r) => r,
                    Err(e) => {
                        error!("telegram poll error (retry in {backoff_secs}s): {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(60);
                        continue;
                    }
                };

                let body: TgResponse<Vec<TgUpdate>> = match resp.json().await {
                    Ok(b) => b,
                    Err(e) => {
                        error!("telegram parse error (retry in {backoff_secs}s): {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(60);
                        continue;
                    }
                };

                if !body.ok {
                    error!(
                        "telegram API error (retry in {backoff_secs}s): {}",
                        body.description.unwrap_or_default()
                    );
                    tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                    backoff_secs = (backoff_secs * 2).min(60);
                    continue;
                }

                // Successful poll -- reset backoff.
                backoff_secs = 1;

                let updates = body.result.unwrap_or_default();

                if let Some(last_update) = updates.last() {
                    *last_update_id.lock().await = Some(last_update.update_id);
                }

                for update in updates {
                    let Some(msg) = update.message else {
                        continue;
                    };

                    if !chat_allowed(&allowed_chats, msg.chat.id) {
                        debug!("telegram: ignoring message from chat {} (not allowed)", msg.chat.id);
                        continue;
                    }

                    let Some(incoming) = to_incoming(msg) else {
                        continue;
                    };

                    if tx.send(incoming).await.is_err() {
                        info!("telegram channel receiver dropped, stopping poll");
                        return;
                    }
                }
            }
        });

        let previous = self
            .poll_handle
            .lock()
            .map_err(|_| ChorusError::Channel("telegram poll handle lock poisoned".into()))?
            .replace(handle);
        if let Some(previous) = previous {
            warn!("telegram channel started twice, aborting previous poll loop");
            previous.abort();
        }

        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), ChorusError> {
        let chat_id: i64 = message.chat_id.parse().map_err(|e| {
            ChorusError::Channel(format!("invalid telegram chat_id '{}': {e}", message.chat_id))
        })?;

        self.send_content(chat_id, message.reply_to, &message.content)
            .await
    }

    async fn stop(&self) -> Result<(), ChorusError> {
        if let Ok(mut handle) = self.poll_handle.lock() {
            if let Some(h) = handle.take() {
                h.abort();
            }
        }
        info!("Telegram channel stopped");
        Ok(())
    }
}

/// Whether messages from `chat_id` pass the allow-list. Empty allows all.
pub(crate) fn chat_allowed(allowed: &[i64], chat_id: i64) -> bool {
    allowed.is_empty() || allowed.contains(&chat_id)
}

/// Map a Telegram message into the channel-neutral form.
///
/// Returns `None` for messages without a sender (channel posts, some
/// service messages).
pub(crate) fn to_incoming(msg: TgMessage) -> Option<IncomingMessage> {
    let Some(user) = msg.from else {
        debug!("telegram: skipping message without sender in chat {}", msg.chat.id);
        return None;
    };

    let content = if let Some(text) = msg.text {
        MessageContent::Text(text)
    } else if let Some(sticker) = msg.sticker {
        MessageContent::Sticker {
            file_id: sticker.file_id,
            file_unique_id: sticker.file_unique_id,
        }
    } else if let Some(photos) = msg.photo {
        MessageContent::Photo {
            variants: photos
                .into_iter()
                .map(|p| PhotoVariant {
                    file_id: p.file_id,
                    file_unique_id: p.file_unique_id,
                    width: u32::try_from(p.width).unwrap_or(0),
                    height: u32::try_from(p.height).unwrap_or(0),
                })
                .collect(),
            caption: msg.caption,
        }
    } else {
        MessageContent::Unsupported
    };

    let sender_name = if let Some(ref un) = user.username {
        format!("@{un}")
    } else if let Some(ref ln) = user.last_name {
        format!("{} {ln}", user.first_name)
    } else {
        user.first_name.clone()
    };

    debug!(
        "telegram: {} from {} in {} chat {}",
        content.kind(),
        user.id,
        if msg.chat.chat_type.is_empty() {
            "unknown"
        } else {
            msg.chat.chat_type.as_str()
        },
        msg.chat.id
    );

    Some(IncomingMessage {
        id: Uuid::new_v4(),
        channel: "telegram".to_string(),
        chat_id: msg.chat.id.to_string(),
        sender_id: user.id.to_string(),
        sender_name: Some(sender_name),
        message_id: Some(msg.message_id),
        content,
        timestamp: chrono::Utc::now(),
    })
}
