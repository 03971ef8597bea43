//! Echo construction: one reply per content kind.

use chorus_core::message::{IncomingMessage, MessageContent, OutgoingContent, OutgoingMessage};

/// The echo for the message that completed a burst.
///
/// Text is repeated verbatim, stickers and photos by file id. Photos use the
/// largest variant and keep the caption.
pub(super) fn echo_for(incoming: &IncomingMessage) -> Option<OutgoingMessage> {
    let content = match &incoming.content {
        MessageContent::Text(text) => OutgoingContent::Text(text.clone()),
        MessageContent::Sticker { file_id, .. } => OutgoingContent::Sticker {
            file_id: file_id.clone(),
        },
        MessageContent::Photo { caption, .. } => OutgoingContent::Photo {
            file_id: incoming.content.largest_photo()?.file_id.clone(),
            caption: caption.clone(),
        },
        MessageContent::Unsupported => return None,
    };

    Some(OutgoingMessage {
        chat_id: incoming.chat_id.clone(),
        reply_to: incoming.message_id,
        content,
    })
}
