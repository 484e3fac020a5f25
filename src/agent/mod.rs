//! Agent module for the retail assistant
//!
//! This module contains the conversation logic: the session facade, the
//! model/tool orchestration loop, the in-run transcript, response
//! normalization and request metrics.

pub mod assistant;
pub mod metrics;
pub mod normalizer;
pub mod orchestrator;
pub mod transcript;

pub use assistant::Assistant;
pub use metrics::{ChatMetrics, ChatRecord, NoopMetrics, RecorderMetrics};
pub use normalizer::{normalize, normalize_with_follow_up, StructuredResult, DEFAULT_FOLLOW_UP};
pub use orchestrator::{Orchestrator, RunOutcome, StopReason};
pub use transcript::Transcript;
