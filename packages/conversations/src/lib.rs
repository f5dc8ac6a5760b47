#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Chat transcript for the in-app assistant.
//!
//! A [`ChatSession`] is an append-only list of [`ChatMessage`]s held in
//! memory for the life of the session. Sending a message appends the
//! user's text and an empty model placeholder; the placeholder is filled
//! with the reply on success and removed on failure, leaving the user's
//! message in place.

pub mod interactive;

use std::fmt::Write as _;

use crowdwatch_ai::AiError;
use crowdwatch_ai::flows;
use crowdwatch_ai::providers::LlmProvider;
use crowdwatch_ai_models::{ChatInput, ChatTurn};
use crowdwatch_location_models::{ChatMessage, ChatRole};
use thiserror::Error;

/// Suggested first questions shown before the user has typed anything.
pub const STARTER_PROMPTS: &[&str] = &[
    "What can this app do?",
    "How is crowd density measured?",
    "How do I add a new location?",
    "What does the real-time view show?",
];

/// Errors from chat session operations.
#[derive(Debug, Error)]
pub enum ConversationError {
    /// The message was empty after trimming.
    #[error("Message is empty")]
    EmptyMessage,

    /// A reply is still pending.
    #[error("A reply is already pending")]
    Busy,

    /// The reply request failed.
    #[error(transparent)]
    Ai(#[from] AiError),
}

/// In-memory chat transcript with at most one pending reply.
#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    pending: bool,
}

impl ChatSession {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages, oldest first. While a reply is pending the last entry
    /// is an empty model placeholder.
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Whether a reply is pending.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending
    }

    /// Starter prompts are offered only before the first message.
    #[must_use]
    pub fn starter_prompts(&self) -> &'static [&'static str] {
        if self.messages.is_empty() {
            STARTER_PROMPTS
        } else {
            &[]
        }
    }

    /// Appends the user's message and a reply placeholder, returning the
    /// request to send.
    ///
    /// The request's history is every message before this one.
    ///
    /// # Errors
    ///
    /// * [`ConversationError::EmptyMessage`] if `text` is blank
    /// * [`ConversationError::Busy`] if a reply is already pending
    pub fn begin_turn(&mut self, text: &str) -> Result<ChatInput, ConversationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ConversationError::EmptyMessage);
        }
        if self.pending {
            return Err(ConversationError::Busy);
        }

        let history = self
            .messages
            .iter()
            .map(|m| ChatTurn {
                role: m.role,
                content: m.text.clone(),
            })
            .collect();

        self.messages.push(ChatMessage::user(text));
        self.messages.push(ChatMessage::model(String::new()));
        self.pending = true;

        Ok(ChatInput {
            history,
            message: text.to_string(),
        })
    }

    /// Fills the placeholder with `reply`.
    pub fn complete_turn(&mut self, reply: String) {
        if !self.pending {
            log::warn!("complete_turn called with no pending reply");
            return;
        }
        if let Some(last) = self.messages.last_mut() {
            last.text = reply;
        }
        self.pending = false;
    }

    /// Drops the placeholder, keeping the user's message.
    pub fn fail_turn(&mut self) {
        if !self.pending {
            return;
        }
        if self
            .messages
            .last()
            .is_some_and(|m| m.role == ChatRole::Model)
        {
            self.messages.pop();
        }
        self.pending = false;
    }

    /// Sends `text` and waits for the reply, which is also appended to the
    /// transcript.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError`] if the message is rejected or the
    /// reply request fails. On failure the user's message stays in the
    /// transcript.
    pub async fn send(
        &mut self,
        provider: &dyn LlmProvider,
        text: &str,
    ) -> Result<String, ConversationError> {
        let input = self.begin_turn(text)?;

        match flows::chat(provider, &input).await {
            Ok(output) => {
                let reply = output.reply.clone();
                self.complete_turn(output.reply);
                Ok(reply)
            }
            Err(e) => {
                log::error!("Chat reply failed: {e}");
                self.fail_turn();
                Err(e.into())
            }
        }
    }
}

/// Formats a transcript for terminal display.
#[must_use]
pub fn format_transcript(messages: &[ChatMessage]) -> String {
    let mut output = String::new();

    for msg in messages {
        let header = match msg.role {
            ChatRole::User => "YOU",
            ChatRole::Model => "ASSISTANT",
        };
        let _ = writeln!(output, "--- {header} ---");
        if msg.text.is_empty() {
            let _ = writeln!(output, "...");
        } else {
            let _ = writeln!(output, "{}", msg.text);
        }
        let _ = writeln!(output);
    }

    output
}

#[cfg(test)]
mod tests {
    use crowdwatch_ai::providers::{ContentBlock, LlmResponse, Message, StopReason};

    use super::*;

    struct ReplyProvider(Option<&'static str>);

    #[async_trait::async_trait]
    impl LlmProvider for ReplyProvider {
        async fn chat(
            &self,
            _system_prompt: &str,
            _messages: &[Message],
            _tools: &[serde_json::Value],
            tool_choice: Option<&str>,
        ) -> Result<LlmResponse, AiError> {
            let Some(reply) = self.0 else {
                return Err(AiError::Provider {
                    message: "offline".to_string(),
                });
            };
            Ok(LlmResponse {
                content: vec![ContentBlock::ToolUse {
                    id: "1".to_string(),
                    name: tool_choice.unwrap_or_default().to_string(),
                    input: serde_json::json!({ "reply": reply }),
                }],
                stop_reason: StopReason::ToolUse,
            })
        }
    }

    #[test]
    fn begin_turn_appends_user_and_placeholder() {
        let mut session = ChatSession::new();
        let input = session.begin_turn("  hello ").unwrap();
        assert_eq!(input.message, "hello");
        assert!(input.history.is_empty());
        assert_eq!(session.messages().len(), 2);
        assert_eq!(session.messages()[0], ChatMessage::user("hello"));
        assert_eq!(session.messages()[1].role, ChatRole::Model);
        assert!(session.is_pending());
    }

    #[test]
    fn blank_and_concurrent_sends_are_rejected() {
        let mut session = ChatSession::new();
        assert!(matches!(
            session.begin_turn("   "),
            Err(ConversationError::EmptyMessage)
        ));
        session.begin_turn("first").unwrap();
        assert!(matches!(
            session.begin_turn("second"),
            Err(ConversationError::Busy)
        ));
        assert_eq!(session.messages().len(), 2);
    }

    #[test]
    fn history_carries_prior_turns() {
        let mut session = ChatSession::new();
        session.begin_turn("hi").unwrap();
        session.complete_turn("hello!".to_string());
        let input = session.begin_turn("what next?").unwrap();
        assert_eq!(input.history.len(), 2);
        assert_eq!(input.history[1].role, ChatRole::Model);
        assert_eq!(input.history[1].content, "hello!");
        assert!(session.starter_prompts().is_empty());
    }

    #[tokio::test]
    async fn send_fills_placeholder_with_reply() {
        let mut session = ChatSession::new();
        assert_eq!(session.starter_prompts().len(), STARTER_PROMPTS.len());
        let reply = session
            .send(&ReplyProvider(Some("It tracks crowds.")), "What can this app do?")
            .await
            .unwrap();
        assert_eq!(reply, "It tracks crowds.");
        assert_eq!(session.messages().len(), 2);
        assert!(!session.is_pending());
    }

    #[tokio::test]
    async fn failed_send_keeps_user_message_only() {
        let mut session = ChatSession::new();
        let result = session.send(&ReplyProvider(None), "hello?").await;
        assert!(matches!(result, Err(ConversationError::Ai(_))));
        assert_eq!(session.messages(), &[ChatMessage::user("hello?")]);
        assert!(!session.is_pending());

        session
            .send(&ReplyProvider(Some("Back online.")), "retry")
            .await
            .unwrap();
        assert_eq!(session.messages().len(), 3);
    }

    #[test]
    fn transcript_marks_pending_reply() {
        let mut session = ChatSession::new();
        session.begin_turn("hi").unwrap();
        let text = format_transcript(session.messages());
        assert!(text.contains("--- YOU ---\nhi"));
        assert!(text.contains("--- ASSISTANT ---\n..."));
    }
}
