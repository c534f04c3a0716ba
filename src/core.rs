//! Chat message model and the low-level completion client abstraction.
//!
//! - Build messages with [`ChatMessage::system`], [`ChatMessage::user`] or
//!   [`ChatMessage::user_with_image`]
//! - Send them with any [`ChatClient`]; the client owns its model identifier
//! - [`render_transcript`] turns a message list into markdown for logs and transcripts

use std::fmt::{self, Debug};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

use crate::error::AIError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

/// One part of a multi-part message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

/// Plain text, or text plus an inlined image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    /// A user message carrying a text part followed by an image part.
    pub fn user_with_image(text: impl Into<String>, image_uri: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: text.into() },
                ContentPart::ImageUrl { image_url: ImageUrl { url: image_uri.into() } },
            ]),
        }
    }

    /// All text carried by this message, parts joined with newlines.
    pub fn text(&self) -> String {
        match &self.content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    pub fn has_image(&self) -> bool {
        matches!(&self.content, MessageContent::Parts(parts)
            if parts.iter().any(|p| matches!(p, ContentPart::ImageUrl { .. })))
    }
}

/// Markdown rendering of a message list. Image parts are summarized, never inlined.
pub fn render_transcript(messages: &[ChatMessage]) -> String {
    let mut out = String::new();
    for message in messages {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(&format!("## {}\n\n", message.role));
        match &message.content {
            MessageContent::Text(text) => out.push_str(text),
            MessageContent::Parts(parts) => {
                let rendered: Vec<String> = parts
                    .iter()
                    .map(|part| match part {
                        ContentPart::Text { text } => text.clone(),
                        ContentPart::ImageUrl { image_url } => summarize_image_url(&image_url.url),
                    })
                    .collect();
                out.push_str(&rendered.join("\n\n"));
            }
        }
    }
    out
}

/// `[image: <mime>, <n> bytes]` for inline data URIs; the payload itself is never written.
fn summarize_image_url(url: &str) -> String {
    match url.strip_prefix("data:").and_then(|rest| rest.split_once(";base64,")) {
        Some((mime, payload)) => match STANDARD.decode(payload) {
            Ok(bytes) => format!("[image: {}, {} bytes]", mime, bytes.len()),
            Err(_) => format!("[image: {}]", mime),
        },
        None => format!("[image: {}]", url),
    }
}

/// Low-level chat completion client.
///
/// Implementors send the messages to their backend with their own model
/// identifier and return the first generated message. One call per invocation,
/// no retries.
#[async_trait]
pub trait ChatClient: Send + Sync + Debug {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, AIError>;

    /// Model identifier sent with every request
    fn model(&self) -> &str;

    /// Clone this client into a boxed trait object
    fn clone_box(&self) -> Box<dyn ChatClient>;
}

impl Clone for Box<dyn ChatClient> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[async_trait]
impl ChatClient for Box<dyn ChatClient> {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, AIError> {
        self.as_ref().complete(messages).await
    }

    fn model(&self) -> &str {
        self.as_ref().model()
    }

    fn clone_box(&self) -> Box<dyn ChatClient> {
        self.as_ref().clone_box()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_message_serializes_as_string_content() {
        let json = serde_json::to_value(ChatMessage::system("Be kind.")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "system", "content": "Be kind."}));
    }

    #[test]
    fn image_message_serializes_as_typed_parts() {
        let message = ChatMessage::user_with_image("Look", "data:image/png;base64,AAAA");
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "role": "user",
                "content": [
                    {"type": "text", "text": "Look"},
                    {"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}}
                ]
            })
        );
        assert!(message.has_image());
        assert_eq!(message.text(), "Look");
    }

    #[test]
    fn transcript_summarizes_images() {
        let rendered = render_transcript(&[
            ChatMessage::system("sys"),
            ChatMessage::user_with_image("Why?", "data:image/jpeg;base64,QUJDRA=="),
        ]);
        assert!(rendered.starts_with("## system\n\nsys"));
        assert!(rendered.contains("## user\n\nWhy?"));
        assert!(rendered.contains("[image: image/jpeg, 4 bytes]"));
        assert!(!rendered.contains("QUJDRA=="));
    }

    #[test]
    fn undecodable_image_payload_keeps_only_the_mime() {
        let rendered = render_transcript(&[ChatMessage::user_with_image(
            "Why?",
            "data:image/png;base64,not*base64",
        )]);
        assert!(rendered.contains("[image: image/png]"));
        assert!(!rendered.contains("not*base64"));
    }
}
