//! # Telegram payload builder
//!
//! Builds the JSON bodies for the Bot API and escapes text for MarkdownV2.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::json;

/// Matches the MarkdownV2 entities that are passed through untouched: code
/// spans, bold, italic, strikethrough and links.
static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```.*?```|`[^`]*`|\*[^*]*\*|_[^_]*_|~[^~]*~|\[([^\]]+)\]\(([^)]+)\)")
        .expect("valid MarkdownV2 entity pattern")
});

const SPECIAL: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\',
];

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        if SPECIAL.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}

/// Builds Telegram request payloads for one bot configuration.
#[derive(Debug, Clone)]
pub struct TelegramPayloadBuilder {
    /// Whether to disable web page previews in messages.
    pub disable_web_preview: bool,
}

impl TelegramPayloadBuilder {
    /// Escapes a string for Telegram's MarkdownV2 format.
    ///
    /// Existing entities such as `*bold*` or `[label](url)` are preserved;
    /// special characters outside them, and inside link labels and URLs, are
    /// escaped.
    pub fn escape_markdown_v2(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        for caps in ENTITY.captures_iter(text) {
            let Some(mat) = caps.get(0) else {
                continue;
            };
            escape_into(&mut out, &text[last..mat.start()]);

            if let (Some(label), Some(url)) = (caps.get(1), caps.get(2)) {
                out.push('[');
                escape_into(&mut out, label.as_str());
                out.push_str("](");
                escape_into(&mut out, url.as_str());
                out.push(')');
            } else {
                out.push_str(mat.as_str());
            }

            last = mat.end();
        }

        escape_into(&mut out, &text[last..]);
        out
    }

    /// Body of a `sendMessage` request.
    pub fn message(&self, chat_id: &str, text: &str) -> serde_json::Value {
        json!({
            "chat_id": chat_id,
            "text": Self::escape_markdown_v2(text),
            "parse_mode": "MarkdownV2",
            "disable_web_page_preview": self.disable_web_preview
        })
    }

    /// Text fields of a `sendPhoto` request. The image itself travels as a
    /// multipart file part.
    pub fn photo_fields(&self, chat_id: &str, caption: &str) -> Vec<(&'static str, String)> {
        let mut fields = vec![("chat_id", chat_id.to_string())];
        if !caption.is_empty() {
            fields.push(("caption", Self::escape_markdown_v2(caption)));
            fields.push(("parse_mode", "MarkdownV2".to_string()));
        }
        fields
    }
}
