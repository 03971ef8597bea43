//! Tests for the Telegram channel module.

use super::polling::{chat_allowed, to_incoming};
use super::send::build_request;
use super::types::*;
use chorus_core::message::{MessageContent, OutgoingContent};

fn message(json: &str) -> TgMessage {
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_tg_chat_type_defaults_when_missing() {
    let chat: TgChat = serde_json::from_str(r#"{"id": 123}"#).unwrap();
    assert_eq!(chat.chat_type, "");
}

#[test]
fn test_tg_update_without_message() {
    let update: TgUpdate =
        serde_json::from_str(r#"{"update_id": 9, "edited_message": {}}"#).unwrap();
    assert_eq!(update.update_id, 9);
    assert!(update.message.is_none());
}

#[test]
fn test_tg_response_error() {
    let resp: TgResponse<Vec<TgUpdate>> = serde_json::from_str(
        r#"{"ok": false, "error_code": 401, "description": "Unauthorized"}"#,
    )
    .unwrap();
    assert!(!resp.ok);
    assert!(resp.result.is_none());
    assert_eq!(resp.description.as_deref(), Some("Unauthorized"));
}

#[test]
fn test_text_message_to_incoming() {
    let msg = message(
        r#"{
            "message_id": 42,
            "from": {"id": 7, "is_bot": false, "first_name": "Ann", "username": "ann"},
            "chat": {"id": -100555, "type": "supergroup"},
            "text": "  Hello World "
        }"#,
    );
    let incoming = to_incoming(msg).unwrap();
    assert_eq!(incoming.channel, "telegram");
    assert_eq!(incoming.chat_id, "-100555");
    assert_eq!(incoming.sender_id, "7");
    assert_eq!(incoming.sender_name.as_deref(), Some("@ann"));
    assert_eq!(incoming.message_id, Some(42));
    // Text is passed through untouched; normalization happens later.
    assert_eq!(incoming.content, MessageContent::Text("  Hello World ".into()));
}

#[test]
fn test_sticker_message_to_incoming() {
    let msg = message(
        r#"{
            "message_id": 1,
            "from": {"id": 8, "first_name": "Bo", "last_name": "Li"},
            "chat": {"id": -1, "type": "group"},
            "sticker": {
                "file_id": "CAACAgIAAxkBAAEB",
                "file_unique_id": "AgADxQADVp29Cg",
                "type": "regular",
                "width": 512,
                "height": 512,
                "is_animated": false,
                "is_video": false
            }
        }"#,
    );
    let incoming = to_incoming(msg).unwrap();
    assert_eq!(incoming.sender_name.as_deref(), Some("Bo Li"));
    assert_eq!(
        incoming.content,
        MessageContent::Sticker {
            file_id: "CAACAgIAAxkBAAEB".into(),
            file_unique_id: "AgADxQADVp29Cg".into(),
        }
    );
}

#[test]
fn test_photo_message_to_incoming_keeps_all_sizes() {
    let msg = message(
        r#"{
            "message_id": 3,
            "from": {"id": 9, "first_name": "Cy"},
            "chat": {"id": -1, "type": "group"},
            "photo": [
                {"file_id": "s", "file_unique_id": "us", "width": 90, "height": 67, "file_size": 1000},
                {"file_id": "m", "file_unique_id": "um", "width": 320, "height": 240},
                {"file_id": "l", "file_unique_id": "ul", "width": 1280, "height": 960}
            ],
            "caption": "Check this out"
        }"#,
    );
    let incoming = to_incoming(msg).unwrap();
    assert_eq!(incoming.sender_name.as_deref(), Some("Cy"));
    match &incoming.content {
        MessageContent::Photo { variants, caption } => {
            assert_eq!(variants.len(), 3);
            assert_eq!(caption.as_deref(), Some("Check this out"));
        }
        other => panic!("expected photo, got {other:?}"),
    }
    let largest = incoming.content.largest_photo().unwrap();
    assert_eq!(largest.file_id, "l");
    assert_eq!(largest.file_unique_id, "ul");
    assert_eq!((largest.width, largest.height), (1280, 960));
}

#[test]
fn test_unsupported_message_to_incoming() {
    let msg = message(
        r#"{
            "message_id": 4,
            "from": {"id": 10, "first_name": "Di"},
            "chat": {"id": -1, "type": "group"},
            "voice": {"file_id": "v", "file_unique_id": "uv", "duration": 3}
        }"#,
    );
    let incoming = to_incoming(msg).unwrap();
    assert_eq!(incoming.content, MessageContent::Unsupported);
}

#[test]
fn test_message_without_sender_is_skipped() {
    let msg = message(
        r#"{
            "message_id": 5,
            "chat": {"id": -100777, "type": "channel"},
            "text": "channel post"
        }"#,
    );
    assert!(to_incoming(msg).is_none());
}

#[test]
fn test_build_text_request_is_plain() {
    let (method, body) = build_request(-100, None, &OutgoingContent::Text("*hi*".into()));
    assert_eq!(method, "sendMessage");
    assert_eq!(body["chat_id"], -100);
    assert_eq!(body["text"], "*hi*");
    assert!(body.get("parse_mode").is_none());
    assert!(body.get("reply_parameters").is_none());
}

#[test]
fn test_build_request_with_reply() {
    let (_, body) = build_request(-100, Some(77), &OutgoingContent::Text("hi".into()));
    assert_eq!(body["reply_parameters"]["message_id"], 77);
    assert_eq!(body["reply_parameters"]["allow_sending_without_reply"], true);
}

#[test]
fn test_build_sticker_request() {
    let (method, body) = build_request(
        -100,
        Some(1),
        &OutgoingContent::Sticker {
            file_id: "CAAC".into(),
        },
    );
    assert_eq!(method, "sendSticker");
    assert_eq!(body["sticker"], "CAAC");
}

#[test]
fn test_build_photo_request_with_and_without_caption() {
    let (method, body) = build_request(
        -100,
        None,
        &OutgoingContent::Photo {
            file_id: "AgAC".into(),
            caption: Some("nice".into()),
        },
    );
    assert_eq!(method, "sendPhoto");
    assert_eq!(body["photo"], "AgAC");
    assert_eq!(body["caption"], "nice");

    let (_, body) = build_request(
        -100,
        None,
        &OutgoingContent::Photo {
            file_id: "AgAC".into(),
            caption: None,
        },
    );
    assert!(body.get("caption").is_none());
}

#[test]
fn test_empty_allow_list_accepts_every_chat() {
    assert!(chat_allowed(&[], -1001234));
    assert!(chat_allowed(&[], 42));
}

#[test]
fn test_allow_list_filters_chats() {
    let allowed = [-1001234, 42];
    assert!(chat_allowed(&allowed, -1001234));
    assert!(chat_allowed(&allowed, 42));
    assert!(!chat_allowed(&allowed, -1009999));
}
