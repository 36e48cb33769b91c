// ABOUTME: Conversation normalizer bounding the chat history handed to the language model
// ABOUTME: Role whitelist, per-message length cap, message-count window, fast input rejection
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comanda

//! # Conversation Normalizer
//!
//! Trims and bounds the raw chat history before any model or database call.
//! Entries with non-string content, empty-after-trim text, or an unknown role
//! are dropped silently; surviving text is capped at
//! [`MAX_MESSAGE_CHARS`] characters and only the last [`MAX_MESSAGES`]
//! entries are kept, in order. A conversation that ends up empty, or whose
//! last message is not from the operator, is rejected before any collaborator
//! is touched.

use serde::Deserialize;
use serde_json::Value;

use crate::errors::{AppError, AppResult};
use crate::llm::{ChatMessage, MessageRole};

/// Maximum number of messages replayed to the model, oldest dropped first
pub const MAX_MESSAGES: usize = 12;

/// Maximum characters kept per message
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// A raw inbound message, before validation
///
/// Both fields are lenient on purpose: a malformed entry must not fail the
/// whole request body, it is simply dropped during normalization.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMessage {
    /// Claimed role; anything outside the whitelist drops the entry
    #[serde(default)]
    pub role: Option<String>,
    /// Message content; non-string values drop the entry
    #[serde(default)]
    pub content: Option<Value>,
}

impl RawMessage {
    /// Convenience constructor for tests and internal callers
    #[must_use]
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: Some(role.to_owned()),
            content: Some(Value::String(content.to_owned())),
        }
    }
}

/// Normalize the raw history into a bounded, validated conversation
///
/// # Errors
///
/// Returns an input-shape error if no valid message survives, or if the last
/// surviving message is not from the `user` role.
pub fn normalize_conversation(raw: &[RawMessage]) -> AppResult<Vec<ChatMessage>> {
    let mut messages: Vec<ChatMessage> = raw
        .iter()
        .filter_map(|entry| {
            let role = entry.role.as_deref().and_then(MessageRole::parse)?;
            let text = match &entry.content {
                Some(Value::String(text)) => text.trim(),
                _ => return None,
            };
            if text.is_empty() {
                return None;
            }
            let capped: String = text.chars().take(MAX_MESSAGE_CHARS).collect();
            Some(ChatMessage::new(role, capped))
        })
        .collect();

    if messages.len() > MAX_MESSAGES {
        messages.drain(..messages.len() - MAX_MESSAGES);
    }

    let Some(last) = messages.last() else {
        return Err(AppError::empty_conversation(
            "nenhuma mensagem válida após a normalização",
        ));
    };

    if last.role != MessageRole::User {
        return Err(AppError::invalid_input(
            "a última mensagem da conversa deve ser do operador",
        ));
    }

    Ok(messages)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn user(text: &str) -> RawMessage {
        RawMessage::new("user", text)
    }

    #[test]
    fn test_keeps_last_twelve_in_order() {
        let raw: Vec<RawMessage> = (0..20).map(|i| user(&format!("pergunta {i}"))).collect();
        let normalized = normalize_conversation(&raw).unwrap();
        assert_eq!(normalized.len(), MAX_MESSAGES);
        assert_eq!(normalized[0].content, "pergunta 8");
        assert_eq!(normalized[11].content, "pergunta 19");
    }

    #[test]
    fn test_drops_invalid_entries() {
        let raw = vec![
            RawMessage {
                role: Some("tool".to_owned()),
                content: Some(Value::String("ignorado".to_owned())),
            },
            RawMessage {
                role: Some("user".to_owned()),
                content: Some(Value::Number(42.into())),
            },
            RawMessage {
                role: Some("user".to_owned()),
                content: Some(Value::String("   ".to_owned())),
            },
            RawMessage {
                role: None,
                content: Some(Value::String("sem papel".to_owned())),
            },
            user("pergunta válida"),
        ];
        let normalized = normalize_conversation(&raw).unwrap();
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].content, "pergunta válida");
    }

    #[test]
    fn test_caps_message_length() {
        let long = "x".repeat(MAX_MESSAGE_CHARS + 500);
        let normalized = normalize_conversation(&[user(&long)]).unwrap();
        assert_eq!(normalized[0].content.chars().count(), MAX_MESSAGE_CHARS);
    }

    #[test]
    fn test_rejects_empty_conversation() {
        let error = normalize_conversation(&[]).unwrap_err();
        assert_eq!(error.http_status(), 400);
    }

    #[test]
    fn test_rejects_assistant_terminated_conversation() {
        let raw = vec![user("oi"), RawMessage::new("assistant", "olá!")];
        assert!(normalize_conversation(&raw).is_err());
    }
}
