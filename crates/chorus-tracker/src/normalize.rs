//! Content identity for burst matching.

use chorus_core::message::MessageContent;
use std::fmt;

/// Identity of a message payload within a chat.
///
/// `text:<trimmed lowercase text>`, `sticker:<unique id>` or
/// `photo:<unique id of the largest variant>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentKey(String);

impl ContentKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the content key of a message, or `None` if it is not trackable.
///
/// Texts that differ only in case or surrounding whitespace share a key.
/// Photo captions are not part of the identity.
pub fn normalize(content: &MessageContent) -> Option<ContentKey> {
    let key = match content {
        MessageContent::Text(text) => {
            let text = text.trim().to_lowercase();
            if text.is_empty() {
                return None;
            }
            format!("text:{text}")
        }
        MessageContent::Sticker { file_unique_id, .. } => {
            if file_unique_id.is_empty() {
                return None;
            }
            format!("sticker:{file_unique_id}")
        }
        MessageContent::Photo { .. } => {
            let largest = content.largest_photo()?;
            if largest.file_unique_id.is_empty() {
                return None;
            }
            format!("photo:{}", largest.file_unique_id)
        }
        MessageContent::Unsupported => return None,
    };
    Some(ContentKey(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chorus_core::message::PhotoVariant;

    fn text_key(text: &str) -> Option<String> {
        normalize(&MessageContent::Text(text.to_string())).map(|k| k.to_string())
    }

    fn photo(ids: &[(&str, u32)], caption: Option<&str>) -> MessageContent {
        MessageContent::Photo {
            variants: ids
                .iter()
                .map(|(id, side)| PhotoVariant {
                    file_id: format!("send-{id}"),
                    file_unique_id: id.to_string(),
                    width: *side,
                    height: *side,
                })
                .collect(),
            caption: caption.map(str::to_string),
        }
    }

    #[test]
    fn test_text_case_and_whitespace_equivalence() {
        let a = text_key("Hi ");
        let b = text_key("hi");
        let c = text_key(" HI");
        assert_eq!(a.as_deref(), Some("text:hi"));
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_text_inner_whitespace_is_kept() {
        assert_eq!(text_key("  Good  Morning\n").as_deref(), Some("text:good  morning"));
        assert_ne!(text_key("good morning"), text_key("good  morning"));
    }

    #[test]
    fn test_text_unicode_lowercase() {
        assert_eq!(text_key("ПРИВЕТ"), text_key("привет"));
        assert_eq!(text_key("复读"), Some("text:复读".to_string()));
    }

    #[test]
    fn test_empty_text_not_trackable() {
        assert!(text_key("").is_none());
        assert!(text_key("   \n\t").is_none());
    }

    #[test]
    fn test_sticker_uses_unique_id() {
        let key = normalize(&MessageContent::Sticker {
            file_id: "CAACAgIAAxkBAAE".into(),
            file_unique_id: "AgADxQ".into(),
        });
        assert_eq!(key.unwrap().as_str(), "sticker:AgADxQ");
    }

    #[test]
    fn test_sticker_without_unique_id_not_trackable() {
        let key = normalize(&MessageContent::Sticker {
            file_id: "CAACAgIAAxkBAAE".into(),
            file_unique_id: String::new(),
        });
        assert!(key.is_none());
    }

    #[test]
    fn test_photo_uses_largest_variant() {
        let key = normalize(&photo(&[("s", 90), ("l", 1280), ("m", 320)], None));
        assert_eq!(key.unwrap().as_str(), "photo:l");
    }

    #[test]
    fn test_photo_caption_ignored() {
        let a = normalize(&photo(&[("s", 90), ("l", 800)], Some("look at this")));
        let b = normalize(&photo(&[("s", 90), ("l", 800)], None));
        assert_eq!(a, b);
    }

    #[test]
    fn test_photo_without_variants_not_trackable() {
        assert!(normalize(&photo(&[], Some("caption only"))).is_none());
    }

    #[test]
    fn test_kinds_do_not_collide() {
        let text = normalize(&MessageContent::Text("abc".into())).unwrap();
        let sticker = normalize(&MessageContent::Sticker {
            file_id: "x".into(),
            file_unique_id: "abc".into(),
        })
        .unwrap();
        let photo = normalize(&photo(&[("abc", 10)], None)).unwrap();
        assert_ne!(text, sticker);
        assert_ne!(sticker, photo);
        assert_ne!(text, photo);
    }

    #[test]
    fn test_unsupported_not_trackable() {
        assert!(normalize(&MessageContent::Unsupported).is_none());
    }
}
