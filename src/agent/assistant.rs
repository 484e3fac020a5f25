//! Session facade
//!
//! [`Assistant::chat`] is the single entry point used by the CLI and the
//! HTTP server. It serializes requests per session, replays the recent
//! history, runs the orchestrator and normalizes whatever the model produced
//! into a [`StructuredResult`].

use crate::agent::metrics::{ChatMetrics, ChatRecord, NoopMetrics};
use crate::agent::normalizer::{normalize_with_follow_up, StructuredResult};
use crate::agent::orchestrator::Orchestrator;
use crate::agent::transcript::Transcript;
use crate::config::{AssistantConfig, Config};
use crate::error::{AssistantError, Result};
use crate::memory::{SessionLocks, SessionMemory};
use crate::prompts::build_system_prompt;
use crate::providers::{create_provider, Message, Provider};
use crate::tools::{ToolRegistry, ToolRegistryBuilder};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Conversational retail assistant
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
///
/// # Examples
///
/// ```no_run
/// use retail_assistant::agent::Assistant;
/// use retail_assistant::config::Config;
///
/// # async fn example() -> anyhow::Result<()> {
/// let assistant = Assistant::from_config(&Config::default())?;
/// let result = assistant.chat("show me phones under 20000", "session-1").await?;
/// println!("{}", result.answer);
/// # Ok(())
/// # }
/// ```
pub struct Assistant {
    orchestrator: Orchestrator,
    memory: SessionMemory,
    locks: SessionLocks,
    metrics: Arc<dyn ChatMetrics>,
    system_prompt: String,
    history_window: usize,
    default_follow_up: String,
}

impl Assistant {
    /// Create an assistant from its parts
    ///
    /// # Arguments
    ///
    /// * `provider` - Model provider
    /// * `tools` - Tools offered to the model
    /// * `memory` - Session memory
    /// * `config` - Orchestration settings
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: ToolRegistry,
        memory: SessionMemory,
        config: &AssistantConfig,
    ) -> Self {
        let system_prompt = build_system_prompt(&tools.names());
        let orchestrator = Orchestrator::new(provider, Arc::new(tools), memory.clone())
            .with_max_transitions(config.max_transitions);

        Self {
            orchestrator,
            memory,
            locks: SessionLocks::new(),
            metrics: Arc::new(NoopMetrics),
            system_prompt,
            history_window: config.history_window,
            default_follow_up: config.default_follow_up.clone(),
        }
    }

    /// Build the provider, tools and memory described by `config`
    ///
    /// Session memory never fails construction: an unavailable backend
    /// degrades to no memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider or a tool endpoint cannot be created
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider: Arc<dyn Provider> = Arc::from(create_provider(&config.provider)?);
        let tools = ToolRegistryBuilder::new(config.tools.clone()).build()?;
        let memory = SessionMemory::connect(&config.memory);

        Ok(Self::new(provider, tools, memory, &config.assistant)
            .with_provider_timeout(Duration::from_secs(config.provider.timeout_seconds)))
    }

    /// Report requests to `metrics`
    pub fn with_metrics(mut self, metrics: Arc<dyn ChatMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Bound a single model call
    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.orchestrator = self.orchestrator.with_provider_timeout(timeout);
        self
    }

    /// Answer one customer message
    ///
    /// Requests for the same session are handled one at a time; different
    /// sessions proceed concurrently.
    ///
    /// # Errors
    ///
    /// Returns `AssistantError::InvalidInput` for a blank message or session
    /// id. Every other failure is folded into the returned answer.
    pub async fn chat(&self, message: &str, session_id: &str) -> Result<StructuredResult> {
        let message = message.trim();
        let session_id = session_id.trim();

        if session_id.is_empty() {
            self.metrics.record_rejected("blank_session_id");
            return Err(AssistantError::InvalidInput("session id cannot be empty".to_string()).into());
        }
        if message.is_empty() {
            self.metrics.record_rejected("blank_message");
            return Err(AssistantError::InvalidInput("message cannot be empty".to_string()).into());
        }

        let started = Instant::now();
        let _guard = self.locks.acquire(session_id).await;

        let mut history = self.memory.get(session_id);
        let skip = history.len().saturating_sub(self.history_window);
        let history = history.split_off(skip);

        let user_message = Message::user(message);
        self.memory.append(session_id, &user_message);

        tracing::info!(
            session_id,
            history = history.len(),
            "Handling chat request"
        );

        let transcript = Transcript::new(self.system_prompt.clone(), history, user_message);
        let outcome = self.orchestrator.run(session_id, transcript).await;
        let result = normalize_with_follow_up(&outcome.content, &self.default_follow_up);

        self.metrics.record_chat(&ChatRecord {
            stop: outcome.stop,
            duration: started.elapsed(),
            model_turns: outcome.model_turns,
            tool_calls: outcome.tool_calls,
        });

        Ok(result)
    }

    /// Forget a session's history
    pub fn clear_session(&self, session_id: &str) {
        tracing::info!(session_id, "Clearing session");
        self.memory.clear(session_id);
    }

    /// Number of sessions with unexpired history
    pub fn active_session_count(&self) -> usize {
        self.memory.list_active_sessions().len()
    }

    /// Ids of sessions with unexpired history
    pub fn active_sessions(&self) -> BTreeSet<String> {
        self.memory.list_active_sessions()
    }

    /// Session memory in use
    pub fn memory(&self) -> &SessionMemory {
        &self.memory
    }

    /// Names of the registered tools
    pub fn tool_names(&self) -> Vec<String> {
        self.orchestrator.tools().names()
    }
}

impl std::fmt::Debug for Assistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assistant")
            .field("memory", &self.memory)
            .field("tools", &self.orchestrator.tools().names())
            .field("history_window", &self.history_window)
            .finish()
    }
}
