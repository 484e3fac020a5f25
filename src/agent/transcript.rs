//! In-run message transcript
//!
//! Holds the messages one orchestration run sends to the model: the system
//! prompt, replayed history, the new user message, and every assistant and
//! tool message produced during the run. Nothing here is persisted.

use crate::providers::Message;
use std::collections::HashSet;

/// Ordered messages of a single run
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
    answered_calls: HashSet<String>,
    opening_len: usize,
}

impl Transcript {
    /// Assemble the opening transcript of a run
    ///
    /// # Arguments
    ///
    /// * `system_prompt` - Instructions for the model
    /// * `history` - Replayed persisted messages, oldest first
    /// * `user_message` - The new customer message
    ///
    /// # Examples
    ///
    /// ```
    /// use retail_assistant::agent::Transcript;
    /// use retail_assistant::providers::Message;
    ///
    /// let transcript = Transcript::new(
    ///     "You are a sales assistant",
    ///     vec![Message::user("hi"), Message::assistant("hello")],
    ///     Message::user("show me TVs"),
    /// );
    /// assert_eq!(transcript.len(), 4);
    /// ```
    pub fn new(
        system_prompt: impl Into<String>,
        history: Vec<Message>,
        user_message: Message,
    ) -> Self {
        let mut transcript = Self::default();
        transcript.push(Message::system(system_prompt));
        for message in history {
            transcript.push(message);
        }
        transcript.push(user_message);
        transcript.opening_len = transcript.messages.len();
        transcript
    }

    /// Append a message
    ///
    /// A tool message answering a call that already has a result is
    /// skipped. Returns whether the message was appended.
    pub fn push(&mut self, message: Message) -> bool {
        match &message {
            Message::Tool { tool_call_id, .. } => {
                if !self.answered_calls.insert(tool_call_id.clone()) {
                    tracing::warn!(tool_call_id = %tool_call_id, "Skipping duplicate tool result");
                    return false;
                }
            }
            Message::System { .. } | Message::User { .. } | Message::Assistant { .. } => {}
        }

        self.messages.push(message);
        true
    }

    /// All messages in order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Content of the most recent assistant message produced in this run
    ///
    /// Replayed history does not count; empty content is skipped.
    pub fn last_assistant_content(&self) -> Option<&str> {
        self.messages[self.opening_len..]
            .iter()
            .rev()
            .filter(|m| matches!(m, Message::Assistant { .. }))
            .find_map(|m| m.content().filter(|c| !c.trim().is_empty()))
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the transcript is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{Role, ToolCall};
    use serde_json::json;

    #[test]
    fn test_new_orders_system_history_user() {
        let transcript = Transcript::new(
            "prompt",
            vec![Message::user("a"), Message::assistant("b")],
            Message::user("c"),
        );

        let roles: Vec<Role> = transcript.messages().iter().map(Message::role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
    }

    #[test]
    fn test_duplicate_tool_result_is_skipped() {
        let mut transcript = Transcript::new("p", vec![], Message::user("u"));
        let call = ToolCall::new("call_1", "search_products", json!({"query": "tv"}));
        transcript.push(Message::assistant_with_tools(None, vec![call]));

        assert!(transcript.push(Message::tool("call_1", "search_products", "[]")));
        assert!(!transcript.push(Message::tool("call_1", "search_products", "[1]")));
        assert_eq!(transcript.len(), 4);
    }

    #[test]
    fn test_last_assistant_content_skips_empty() {
        let mut transcript = Transcript::new(
            "p",
            vec![Message::user("earlier"), Message::assistant("from history")],
            Message::user("u"),
        );
        assert!(transcript.last_assistant_content().is_none());

        transcript.push(Message::assistant("first"));
        transcript.push(Message::assistant_with_tools(
            Some("  ".to_string()),
            vec![ToolCall::new("c", "search_products", json!({}))],
        ));
        assert_eq!(transcript.last_assistant_content(), Some("first"));
    }
}
