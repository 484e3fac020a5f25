//! Model/tool orchestration state machine
//!
//! One run alternates between asking the model for a response
//! (`ModelTurn`) and dispatching the tool calls it requested
//! (`ToolExecution`) until the model answers without tool calls
//! (`Terminal`) or the transition bound is reached.
//!
//! Assistant messages with content are persisted as they are produced (tool
//! calls stripped). Tool results only ever live in the run transcript.

use crate::agent::normalizer::StructuredResult;
use crate::agent::transcript::Transcript;
use crate::memory::SessionMemory;
use crate::providers::{Message, Provider, ToolCall};
use crate::tools::{ToolDefinition, ToolRegistry};
use std::sync::Arc;
use std::time::Duration;

/// Default bound on state transitions per run
pub const DEFAULT_MAX_TRANSITIONS: usize = 15;

const PROVIDER_ERROR_ANSWER: &str =
    "I'm sorry, I encountered an error while processing your request. Please try again.";
const PROVIDER_ERROR_FOLLOW_UP: &str = "How else can I help you with our products?";
const LIMIT_FALLBACK_ANSWER: &str = "I apologize, but I couldn't process your request at the \
moment. Please try again or contact our support team.";
const LIMIT_FALLBACK_FOLLOW_UP: &str = "How else can I assist you with our products today?";

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The model answered without requesting tools
    Completed,
    /// The transition bound was reached first
    IterationLimit,
    /// The model call failed or timed out
    ProviderError,
}

impl StopReason {
    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::IterationLimit => "iteration_limit",
            Self::ProviderError => "provider_error",
        }
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
enum RunState {
    ModelTurn,
    ToolExecution(Vec<ToolCall>),
    Terminal(Option<String>),
}

/// Result of one orchestration run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Final assistant content, ready for normalization
    pub content: String,
    /// State transitions taken
    pub transitions: usize,
    /// Model calls made
    pub model_turns: usize,
    /// Tool calls dispatched
    pub tool_calls: usize,
    /// How the run ended
    pub stop: StopReason,
    /// Every message exchanged during the run
    pub transcript: Transcript,
}

/// Drives one conversation turn through the model and tools
pub struct Orchestrator {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    memory: SessionMemory,
    max_transitions: usize,
    provider_timeout: Duration,
}

impl Orchestrator {
    /// Create an orchestrator with the default transition bound and a 60
    /// second provider timeout
    pub fn new(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>, memory: SessionMemory) -> Self {
        Self {
            provider,
            tools,
            memory,
            max_transitions: DEFAULT_MAX_TRANSITIONS,
            provider_timeout: Duration::from_secs(60),
        }
    }

    /// Set the transition bound
    pub fn with_max_transitions(mut self, max_transitions: usize) -> Self {
        self.max_transitions = max_transitions;
        self
    }

    /// Set the upper bound for a single model call
    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// The tool registry offered to the model
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run the state machine to completion
    ///
    /// Never fails: provider errors end the run with an apology, and the
    /// transition bound ends it with the latest in-run content.
    ///
    /// # Arguments
    ///
    /// * `session_id` - Session assistant messages are persisted to
    /// * `transcript` - Opening transcript (system prompt, history, user message)
    pub async fn run(&self, session_id: &str, mut transcript: Transcript) -> RunOutcome {
        let definitions = self.tools.definitions();
        let mut state = RunState::ModelTurn;
        let mut transitions = 0;
        let mut model_turns = 0;
        let mut tool_calls = 0;
        let mut stop = StopReason::Completed;

        tracing::info!(session_id, messages = transcript.len(), "Starting orchestration run");

        let terminal_content = loop {
            state = match state {
                RunState::Terminal(content) => break content,
                _ if transitions >= self.max_transitions => {
                    tracing::warn!(
                        session_id,
                        transitions,
                        "Transition limit reached before a final answer"
                    );
                    stop = StopReason::IterationLimit;
                    break None;
                }
                RunState::ModelTurn => {
                    model_turns += 1;
                    let (next, failed) = self
                        .model_turn(session_id, &mut transcript, &definitions)
                        .await;
                    if failed {
                        stop = StopReason::ProviderError;
                    }
                    next
                }
                RunState::ToolExecution(calls) => {
                    for call in &calls {
                        let result = self.tools.dispatch(call).await;
                        tool_calls += 1;
                        transcript.push(result.to_message());
                    }
                    RunState::ModelTurn
                }
            };
            transitions += 1;
            tracing::debug!(session_id, transitions, state = ?state, "Transition");
        };

        let content = match terminal_content {
            Some(content) => content,
            None => match transcript.last_assistant_content() {
                Some(content) => content.to_string(),
                None => {
                    let fallback = StructuredResult::new(LIMIT_FALLBACK_ANSWER)
                        .with_end(LIMIT_FALLBACK_FOLLOW_UP)
                        .to_json_string();
                    self.memory.append(session_id, &Message::assistant(fallback.clone()));
                    fallback
                }
            },
        };

        tracing::info!(
            session_id,
            stop = %stop,
            transitions,
            model_turns,
            tool_calls,
            "Orchestration run finished"
        );

        RunOutcome {
            content,
            transitions,
            model_turns,
            tool_calls,
            stop,
            transcript,
        }
    }

    /// One model call; returns the next state and whether the call failed
    async fn model_turn(
        &self,
        session_id: &str,
        transcript: &mut Transcript,
        definitions: &[ToolDefinition],
    ) -> (RunState, bool) {
        let completion = tokio::time::timeout(
            self.provider_timeout,
            self.provider.complete(transcript.messages(), definitions),
        )
        .await;

        let message = match completion {
            Ok(Ok(response)) => response.message,
            Ok(Err(e)) => {
                tracing::warn!(session_id, error = %e, "Model call failed");
                return (self.apologize(session_id, transcript), true);
            }
            Err(_) => {
                tracing::warn!(
                    session_id,
                    timeout = ?self.provider_timeout,
                    "Model call timed out"
                );
                return (self.apologize(session_id, transcript), true);
            }
        };

        let (content, calls) = match &message {
            Message::Assistant {
                content,
                tool_calls,
                ..
            } => (
                content.clone().filter(|c| !c.trim().is_empty()),
                tool_calls.clone(),
            ),
            Message::System { .. } | Message::User { .. } | Message::Tool { .. } => {
                tracing::warn!(
                    session_id,
                    role = %message.role(),
                    "Model returned a non-assistant message"
                );
                return (self.apologize(session_id, transcript), true);
            }
        };

        if let Some(text) = &content {
            self.memory.append(session_id, &Message::assistant(text.clone()));
        }
        transcript.push(message);

        if calls.is_empty() {
            (RunState::Terminal(content), false)
        } else {
            tracing::debug!(
                session_id,
                tools = ?calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
                "Model requested tools"
            );
            (RunState::ToolExecution(calls), false)
        }
    }

    fn apologize(&self, session_id: &str, transcript: &mut Transcript) -> RunState {
        let apology = StructuredResult::new(PROVIDER_ERROR_ANSWER)
            .with_end(PROVIDER_ERROR_FOLLOW_UP)
            .to_json_string();
        let message = Message::assistant(apology.clone());
        self.memory.append(session_id, &message);
        transcript.push(message);
        RunState::Terminal(Some(apology))
    }
}
