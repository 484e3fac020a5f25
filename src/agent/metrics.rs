//! Chat request metrics
//!
//! The assistant reports every request through the [`ChatMetrics`]
//! interface it was constructed with; nothing is counted in globals owned by
//! this crate.
//!
//! # Metrics
//!
//! [`RecorderMetrics`] forwards to the `metrics` facade:
//!
//! - `assistant_chat_requests_total`: Counter of answered requests by stop reason
//! - `assistant_chat_duration_seconds`: Histogram of request latency by stop reason
//! - `assistant_chat_tool_calls`: Histogram of tool calls per request
//! - `assistant_chat_model_turns`: Histogram of model turns per request
//! - `assistant_chat_rejected_total`: Counter of rejected requests by reason
//!
//! # Examples
//!
//! ```
//! use retail_assistant::agent::metrics::{ChatMetrics, ChatRecord, RecorderMetrics};
//! use retail_assistant::agent::StopReason;
//! use std::time::Duration;
//!
//! let metrics = RecorderMetrics;
//! metrics.record_chat(&ChatRecord {
//!     stop: StopReason::Completed,
//!     duration: Duration::from_millis(850),
//!     model_turns: 2,
//!     tool_calls: 1,
//! });
//! ```

use crate::agent::orchestrator::StopReason;
use metrics::{histogram, increment_counter};
use std::time::Duration;

/// Summary of one answered chat request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatRecord {
    /// How the orchestration run ended
    pub stop: StopReason,
    /// Wall-clock time of the request, lock wait included
    pub duration: Duration,
    /// Model calls made
    pub model_turns: usize,
    /// Tool calls dispatched
    pub tool_calls: usize,
}

/// Sink for chat request metrics
pub trait ChatMetrics: Send + Sync {
    /// Record an answered request
    fn record_chat(&self, record: &ChatRecord);

    /// Record a request rejected before orchestration
    fn record_rejected(&self, reason: &str);
}

/// Metrics sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl ChatMetrics for NoopMetrics {
    fn record_chat(&self, _record: &ChatRecord) {}

    fn record_rejected(&self, _reason: &str) {}
}

/// Metrics sink backed by the `metrics` crate
///
/// Values go to whatever recorder the binary installs; without one the
/// macros are no-ops.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecorderMetrics;

impl ChatMetrics for RecorderMetrics {
    fn record_chat(&self, record: &ChatRecord) {
        let stop = record.stop.as_str();

        increment_counter!("assistant_chat_requests_total", "stop" => stop);

        histogram!(
            "assistant_chat_duration_seconds",
            record.duration.as_secs_f64(),
            "stop" => stop
        );

        histogram!("assistant_chat_tool_calls", record.tool_calls as f64);

        histogram!("assistant_chat_model_turns", record.model_turns as f64);
    }

    fn record_rejected(&self, reason: &str) {
        increment_counter!(
            "assistant_chat_rejected_total",
            "reason" => reason.to_string()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ChatRecord {
        ChatRecord {
            stop: StopReason::IterationLimit,
            duration: Duration::from_secs(2),
            model_turns: 8,
            tool_calls: 7,
        }
    }

    #[test]
    fn test_noop_metrics_accepts_records() {
        let metrics = NoopMetrics;
        metrics.record_chat(&sample());
        metrics.record_rejected("blank_message");
    }

    #[test]
    fn test_recorder_metrics_without_installed_recorder() {
        let metrics = RecorderMetrics;
        metrics.record_chat(&sample());
        metrics.record_rejected("blank_session_id");
    }

    #[test]
    fn test_metrics_are_object_safe() {
        let sinks: Vec<Box<dyn ChatMetrics>> = vec![Box::new(NoopMetrics), Box::new(RecorderMetrics)];
        for sink in sinks {
            sink.record_chat(&sample());
        }
    }
}
