//! Ollama provider implementation
//!
//! This module implements the Provider trait for Ollama, connecting to a local
//! or remote Ollama server's `/api/chat` endpoint with tool calling support.

use crate::config::OllamaConfig;
use crate::error::{AssistantError, Result};
use crate::providers::{CompletionResponse, Message, Provider, TokenUsage, ToolCall};
use crate::tools::ToolDefinition;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ollama API provider
///
/// # Examples
///
/// ```no_run
/// use retail_assistant::config::OllamaConfig;
/// use retail_assistant::providers::{Message, OllamaProvider, Provider};
///
/// # async fn example() -> retail_assistant::error::Result<()> {
/// let provider = OllamaProvider::new(OllamaConfig::default())?;
/// let completion = provider.complete(&[Message::user("Hello!")], &[]).await?;
/// println!("{:?}", completion.message.content());
/// # Ok(())
/// # }
/// ```
pub struct OllamaProvider {
    client: Client,
    config: OllamaConfig,
    timeout: Duration,
}

/// Request timeout used by [`OllamaProvider::new`]
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Request structure for Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OllamaTool>,
    stream: bool,
}

/// Message structure for Ollama API
#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OllamaToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
}

/// Tool definition for Ollama API
#[derive(Debug, Serialize)]
struct OllamaTool {
    r#type: String,
    function: OllamaFunction,
}

/// Function definition for Ollama tools
#[derive(Debug, Serialize)]
struct OllamaFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

/// Tool call in Ollama format
#[derive(Debug, Serialize, Deserialize)]
struct OllamaToolCall {
    #[serde(default)]
    id: String,
    #[serde(default = "default_tool_type")]
    r#type: String,
    function: OllamaFunctionCall,
}

/// Function call details in Ollama format
#[derive(Debug, Serialize, Deserialize)]
struct OllamaFunctionCall {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

fn default_tool_type() -> String {
    "function".to_string()
}

/// Response structure from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: usize,
    #[serde(default)]
    eval_count: usize,
}

impl OllamaProvider {
    /// Create a new Ollama provider instance
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    ///
    /// # Examples
    ///
    /// ```
    /// use retail_assistant::config::OllamaConfig;
    /// use retail_assistant::providers::OllamaProvider;
    ///
    /// let provider = OllamaProvider::new(OllamaConfig::default());
    /// assert!(provider.is_ok());
    /// ```
    pub fn new(config: OllamaConfig) -> Result<Self> {
        Self::with_timeout(config, DEFAULT_TIMEOUT)
    }

    /// Create a provider whose HTTP requests give up after `timeout`
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn with_timeout(config: OllamaConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("retail-assistant/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AssistantError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized Ollama provider: host={}, model={}, timeout={:?}",
            config.host,
            config.model,
            timeout
        );

        Ok(Self {
            client,
            config,
            timeout,
        })
    }

    /// HTTP request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get the configured Ollama host
    pub fn host(&self) -> &str {
        &self.config.host
    }

    /// Get the configured model name
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn convert_messages(&self, messages: &[Message]) -> Vec<OllamaMessage> {
        crate::providers::validate_message_sequence(messages)
            .iter()
            .filter_map(|m| match m {
                Message::System { content } => Some(OllamaMessage {
                    role: "system".to_string(),
                    content: content.clone(),
                    tool_calls: None,
                    tool_name: None,
                }),
                Message::User { content, .. } => Some(OllamaMessage {
                    role: "user".to_string(),
                    content: content.clone(),
                    tool_calls: None,
                    tool_name: None,
                }),
                Message::Assistant {
                    content,
                    tool_calls,
                    ..
                } => {
                    // Skip messages without content unless they carry tool calls
                    if content.is_none() && tool_calls.is_empty() {
                        return None;
                    }
                    let tool_calls = (!tool_calls.is_empty()).then(|| {
                        tool_calls
                            .iter()
                            .map(|tc| OllamaToolCall {
                                id: tc.id.clone(),
                                r#type: "function".to_string(),
                                function: OllamaFunctionCall {
                                    name: tc.name.clone(),
                                    arguments: serde_json::Value::Object(tc.args.clone()),
                                },
                            })
                            .collect()
                    });
                    Some(OllamaMessage {
                        role: "assistant".to_string(),
                        content: content.clone().unwrap_or_default(),
                        tool_calls,
                        tool_name: None,
                    })
                }
                Message::Tool {
                    content, tool_name, ..
                } => Some(OllamaMessage {
                    role: "tool".to_string(),
                    content: content.clone(),
                    tool_calls: None,
                    tool_name: Some(tool_name.clone()),
                }),
            })
            .collect()
    }

    fn convert_tools(&self, tools: &[ToolDefinition]) -> Vec<OllamaTool> {
        tools
            .iter()
            .map(|t| OllamaTool {
                r#type: "function".to_string(),
                function: OllamaFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }

    fn convert_response_message(&self, ollama_msg: OllamaMessage) -> Message {
        let content = (!ollama_msg.content.trim().is_empty()).then_some(ollama_msg.content);

        match ollama_msg.tool_calls {
            Some(tool_calls) if !tool_calls.is_empty() => {
                let converted: Vec<ToolCall> = tool_calls
                    .into_iter()
                    .map(|tc| {
                        let id = if tc.id.is_empty() {
                            format!("call_{}", uuid::Uuid::new_v4().simple())
                        } else {
                            tc.id
                        };
                        ToolCall::new(id, tc.function.name, tc.function.arguments)
                    })
                    .collect();
                Message::assistant_with_tools(content, converted)
            }
            _ => Message::assistant_with_tools(content, Vec::new()),
        }
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<CompletionResponse> {
        let url = format!("{}/api/chat", self.config.host.trim_end_matches('/'));

        let ollama_request = OllamaRequest {
            model: self.config.model.clone(),
            messages: self.convert_messages(messages),
            tools: self.convert_tools(tools),
            stream: false,
        };

        tracing::debug!(
            "Sending Ollama request: {} messages, {} tools",
            ollama_request.messages.len(),
            ollama_request.tools.len()
        );

        let response = self
            .client
            .post(&url)
            .json(&ollama_request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Ollama request failed: {}", e);
                AssistantError::Provider(format!("Ollama request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Ollama returned error {}: {}", status, error_text);
            return Err(AssistantError::Provider(format!(
                "Ollama returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let ollama_response: OllamaResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Ollama response: {}", e);
            AssistantError::Provider(format!("Failed to parse Ollama response: {}", e))
        })?;

        tracing::debug!(
            "Ollama response: done={}, prompt_tokens={}, completion_tokens={}",
            ollama_response.done,
            ollama_response.prompt_eval_count,
            ollama_response.eval_count
        );

        let message = self.convert_response_message(ollama_response.message);

        let response = if ollama_response.prompt_eval_count > 0 || ollama_response.eval_count > 0 {
            let usage = TokenUsage::new(
                ollama_response.prompt_eval_count,
                ollama_response.eval_count,
            );
            CompletionResponse::with_usage(message, usage)
        } else {
            CompletionResponse::new(message)
        };

        Ok(response)
    }

    fn get_current_model(&self) -> Result<String> {
        Ok(self.config.model.clone())
    }
}
