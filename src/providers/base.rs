//! Base provider trait and common message types
//!
//! This module defines the [`Provider`] trait every language model adapter
//! implements, along with the conversation [`Message`] type, tool call
//! requests and completion responses.

use crate::error::Result;
use crate::tools::ToolDefinition;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions for the model
    System,
    /// Customer input
    User,
    /// Model output
    Assistant,
    /// Tool result fed back to the model
    Tool,
}

impl Role {
    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message in a conversation
///
/// Each variant carries only the fields valid for its role. Messages are
/// immutable once created; the timestamp records arrival time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// System prompt
    System {
        /// Prompt text
        content: String,
    },
    /// Customer message
    User {
        /// Message text
        content: String,
        /// Arrival time
        timestamp: DateTime<Utc>,
    },
    /// Model response, possibly requesting tool calls
    Assistant {
        /// Natural language or JSON content
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        /// Tool calls requested by the model, in model order
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
        /// Arrival time
        timestamp: DateTime<Utc>,
    },
    /// Result of one tool call
    Tool {
        /// Serialized tool result
        content: String,
        /// Name of the tool that produced the result
        tool_name: String,
        /// Id of the tool call this result answers
        tool_call_id: String,
        /// Arrival time
        timestamp: DateTime<Utc>,
    },
}

impl Message {
    /// Creates a new system message
    ///
    /// # Examples
    ///
    /// ```
    /// use retail_assistant::providers::{Message, Role};
    ///
    /// let msg = Message::system("You are a helpful sales assistant");
    /// assert_eq!(msg.role(), Role::System);
    /// ```
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use retail_assistant::providers::{Message, Role};
    ///
    /// let msg = Message::user("Show me phones");
    /// assert_eq!(msg.role(), Role::User);
    /// assert_eq!(msg.content(), Some("Show me phones"));
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Creates a new assistant message with text content and no tool calls
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: Some(content.into()),
            tool_calls: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Creates an assistant message requesting tool calls
    ///
    /// # Examples
    ///
    /// ```
    /// use retail_assistant::providers::{Message, ToolCall};
    ///
    /// let call = ToolCall::new("call_1", "search_products", serde_json::json!({"query": "tv"}));
    /// let msg = Message::assistant_with_tools(None, vec![call]);
    /// assert_eq!(msg.tool_calls().len(), 1);
    /// ```
    pub fn assistant_with_tools(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self::Assistant {
            content,
            tool_calls,
            timestamp: Utc::now(),
        }
    }

    /// Creates a tool result message
    pub fn tool(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::Tool {
            content: content.into(),
            tool_name: tool_name.into(),
            tool_call_id: tool_call_id.into(),
            timestamp: Utc::now(),
        }
    }

    /// Role of this message
    pub fn role(&self) -> Role {
        match self {
            Self::System { .. } => Role::System,
            Self::User { .. } => Role::User,
            Self::Assistant { .. } => Role::Assistant,
            Self::Tool { .. } => Role::Tool,
        }
    }

    /// Text content, if any
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::System { content } | Self::User { content, .. } | Self::Tool { content, .. } => {
                Some(content)
            }
            Self::Assistant { content, .. } => content.as_deref(),
        }
    }

    /// Tool calls requested by an assistant message (empty for other roles)
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Self::Assistant { tool_calls, .. } => tool_calls,
            Self::System { .. } | Self::User { .. } | Self::Tool { .. } => &[],
        }
    }

    /// Arrival time; system prompts are timeless
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::System { .. } => None,
            Self::User { timestamp, .. }
            | Self::Assistant { timestamp, .. }
            | Self::Tool { timestamp, .. } => Some(*timestamp),
        }
    }

    /// Whether session memory keeps this message across runs
    ///
    /// Only user and assistant messages survive a run; tool results are
    /// transient so a stored history never holds half of a tool-call pair.
    pub fn is_persistable(&self) -> bool {
        matches!(self, Self::User { .. } | Self::Assistant { .. })
    }
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call
    pub id: String,
    /// Name of the tool to call
    pub name: String,
    /// Arguments supplied by the model
    #[serde(default)]
    pub args: serde_json::Map<String, serde_json::Value>,
}

impl ToolCall {
    /// Creates a tool call; non-object `args` become an empty argument map
    pub fn new(id: impl Into<String>, name: impl Into<String>, args: serde_json::Value) -> Self {
        let args = match args {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        Self {
            id: id.into(),
            name: name.into(),
            args,
        }
    }
}

/// Token usage information from a completion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    pub prompt_tokens: usize,
    /// Number of tokens in the completion
    pub completion_tokens: usize,
    /// Total tokens used (prompt + completion)
    pub total_tokens: usize,
}

impl TokenUsage {
    /// Create a new TokenUsage instance
    ///
    /// # Examples
    ///
    /// ```
    /// use retail_assistant::providers::TokenUsage;
    ///
    /// let usage = TokenUsage::new(100, 50);
    /// assert_eq!(usage.total_tokens, 150);
    /// ```
    pub fn new(prompt_tokens: usize, completion_tokens: usize) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Response from a provider completion
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// The assistant message produced by the model
    pub message: Message,
    /// Token usage, when the provider reports it
    pub usage: Option<TokenUsage>,
}

impl CompletionResponse {
    /// Wrap a message without usage information
    pub fn new(message: Message) -> Self {
        Self {
            message,
            usage: None,
        }
    }

    /// Wrap a message with usage information
    pub fn with_usage(message: Message, usage: TokenUsage) -> Self {
        Self {
            message,
            usage: Some(usage),
        }
    }
}

/// Language model provider
///
/// Consumes the ordered message list (system prompt, replayed history, new
/// user message and any in-run tool exchanges) plus the tool catalog, and
/// returns one assistant message.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Request a completion
    ///
    /// # Errors
    ///
    /// Returns `AssistantError::Provider` when the model cannot be reached or
    /// answers with something that is not an assistant message.
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<CompletionResponse>;

    /// Name of the model currently used
    fn get_current_model(&self) -> Result<String> {
        Err(crate::error::AssistantError::Provider(
            "Current model information is not available from this provider".to_string(),
        )
        .into())
    }
}

/// Drop tool messages whose call id was never requested by an assistant message
///
/// Providers reject orphan tool results, so adapters run outgoing messages
/// through this filter before serializing them.
pub fn validate_message_sequence(messages: &[Message]) -> Vec<Message> {
    let valid_tool_ids: HashSet<&str> = messages
        .iter()
        .flat_map(|m| m.tool_calls().iter().map(|tc| tc.id.as_str()))
        .collect();

    messages
        .iter()
        .filter(|message| match message {
            Message::Tool { tool_call_id, .. } => {
                if valid_tool_ids.contains(tool_call_id.as_str()) {
                    true
                } else {
                    tracing::warn!(
                        "Dropping orphan tool message with tool_call_id: {}",
                        tool_call_id
                    );
                    false
                }
            }
            _ => true,
        })
        .cloned()
        .collect()
}
