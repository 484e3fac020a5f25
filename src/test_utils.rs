//! Test utilities for the retail assistant
//!
//! This module provides common test utilities: a scripted model provider,
//! temporary directory management, and assertion helpers.

use crate::error::Result;
use crate::providers::{CompletionResponse, Message, Provider, ToolCall};
use crate::tools::ToolDefinition;
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Create a temporary directory for testing
///
/// # Returns
///
/// Returns a TempDir that will be cleaned up when dropped
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T: std::fmt::Debug>(result: Result<T>, expected: &str) {
    match result {
        Ok(value) => panic!("Expected error containing '{}', got Ok({:?})", expected, value),
        Err(e) => {
            let message = e.to_string();
            assert!(
                message.contains(expected),
                "Error message '{}' does not contain '{}'",
                message,
                expected
            );
        }
    }
}

/// Provider that replays scripted responses and records every transcript it
/// receives
///
/// Once the script is exhausted it answers `{"answer":"done"}`, unless it
/// was built with [`ScriptedProvider::always_calling_tools`].
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<Message>>>,
    /// Transcripts seen, one per `complete` call
    pub seen: Arc<Mutex<Vec<Vec<Message>>>>,
    repeat_tool_call: Option<String>,
}

impl ScriptedProvider {
    /// Replay `responses` in order
    pub fn new(responses: Vec<Result<Message>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            seen: Arc::new(Mutex::new(Vec::new())),
            repeat_tool_call: None,
        }
    }

    /// Request `tool` on every call, with content `thinking N`
    pub fn always_calling_tools(tool: impl Into<String>) -> Self {
        Self {
            repeat_tool_call: Some(tool.into()),
            ..Self::new(vec![])
        }
    }

    /// Number of `complete` calls so far
    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn complete(
        &self,
        messages: &[Message],
        _tools: &[ToolDefinition],
    ) -> Result<CompletionResponse> {
        let turn = {
            let mut seen = self.seen.lock().unwrap();
            seen.push(messages.to_vec());
            seen.len()
        };

        if let Some(tool) = &self.repeat_tool_call {
            let call = ToolCall::new(format!("call_{}", turn), tool.clone(), json!({"query": "more"}));
            return Ok(CompletionResponse::new(Message::assistant_with_tools(
                Some(format!("thinking {}", turn)),
                vec![call],
            )));
        }

        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Message::assistant(r#"{"answer":"done"}"#)));
        next.map(CompletionResponse::new)
    }

    fn get_current_model(&self) -> Result<String> {
        Ok("scripted".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssistantError;

    #[tokio::test]
    async fn test_scripted_provider_replays_then_defaults() {
        let provider = ScriptedProvider::new(vec![Ok(Message::assistant("first"))]);

        let first = provider.complete(&[Message::user("a")], &[]).await.unwrap();
        let second = provider.complete(&[Message::user("b")], &[]).await.unwrap();

        assert_eq!(first.message.content(), Some("first"));
        assert_eq!(second.message.content(), Some(r#"{"answer":"done"}"#));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_always_calling_tools_numbers_calls() {
        let provider = ScriptedProvider::always_calling_tools("search_products");

        provider.complete(&[], &[]).await.unwrap();
        let response = provider.complete(&[], &[]).await.unwrap();

        assert_eq!(response.message.content(), Some("thinking 2"));
        assert_eq!(response.message.tool_calls()[0].id, "call_2");
    }

    #[test]
    fn test_assert_error_contains() {
        let result: Result<()> = Err(AssistantError::Config("invalid value".to_string()).into());
        assert_error_contains(result, "invalid value");
    }
}
