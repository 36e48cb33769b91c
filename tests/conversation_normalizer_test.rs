// ABOUTME: Integration tests for conversation normalization as seen by the endpoint
// ABOUTME: Covers the request-body contract: lenient entries, windowing, terminal-role rule
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Comanda

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use comanda_analytics_server::analytics::conversation::{
    normalize_conversation, RawMessage, MAX_MESSAGES, MAX_MESSAGE_CHARS,
};
use comanda_analytics_server::llm::MessageRole;

#[test]
fn test_request_body_deserializes_leniently() {
    // Entries a UI might send with holes in them must parse, then get dropped
    let raw: Vec<RawMessage> = serde_json::from_str(
        r#"[
            {"role": "user", "content": "primeira"},
            {"role": "user"},
            {"content": "sem papel"},
            {"role": "tool", "content": "chamada de função"},
            {"role": "user", "content": {"nested": true}},
            {"role": "user", "content": "última pergunta"}
        ]"#,
    )
    .unwrap();

    let normalized = normalize_conversation(&raw).unwrap();
    assert_eq!(normalized.len(), 2);
    assert_eq!(normalized[1].content, "última pergunta");
}

#[test]
fn test_window_keeps_newest_and_preserves_order() {
    let raw: Vec<RawMessage> = (0..31)
        .map(|i| {
            if i % 2 == 0 {
                RawMessage::new("user", &format!("pergunta {i}"))
            } else {
                RawMessage::new("assistant", &format!("resposta {i}"))
            }
        })
        .collect();

    let normalized = normalize_conversation(&raw).unwrap();
    assert_eq!(normalized.len(), MAX_MESSAGES);
    assert_eq!(normalized.last().unwrap().role, MessageRole::User);
    assert_eq!(normalized.last().unwrap().content, "pergunta 30");
    // Alternation survives the windowing
    assert_eq!(normalized[0].role, MessageRole::Assistant);
    assert_eq!(normalized[0].content, "resposta 19");
}

#[test]
fn test_oversized_message_capped_not_rejected() {
    let oversized = "é".repeat(MAX_MESSAGE_CHARS * 2);
    let normalized = normalize_conversation(&[RawMessage::new("user", &oversized)]).unwrap();
    assert_eq!(normalized[0].content.chars().count(), MAX_MESSAGE_CHARS);
}

#[test]
fn test_all_entries_invalid_is_client_error() {
    let raw = vec![
        RawMessage::new("tool", "x"),
        RawMessage::new("função", "y"),
    ];
    let error = normalize_conversation(&raw).unwrap_err();
    assert_eq!(error.http_status(), 400);
}

#[test]
fn test_system_role_is_accepted_from_history() {
    let raw = vec![
        RawMessage::new("system", "contexto anterior"),
        RawMessage::new("user", "e agora?"),
    ];
    let normalized = normalize_conversation(&raw).unwrap();
    assert_eq!(normalized.len(), 2);
    assert_eq!(normalized[0].role, MessageRole::System);
}
