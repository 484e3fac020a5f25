//! Terms, conditions and privacy policy search tool

use crate::error::{AssistantError, Result};
use crate::tools::{FieldKind, FieldSpec, JsonEndpoint, ToolExecutor, ToolSchema};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

/// Tool name advertised to the model
pub const SEARCH_TERMS_CONDITIONS: &str = "search_terms_conditions";

const DEFAULT_MAX_RESULTS: i64 = 3;
const MAX_RESULTS_LIMIT: i64 = 5;

/// Searches the store's terms, conditions and privacy policies
pub struct PolicySearchTool {
    endpoint: JsonEndpoint,
}

impl PolicySearchTool {
    /// Create the tool on top of a policy search endpoint
    pub fn new(endpoint: JsonEndpoint) -> Self {
        Self { endpoint }
    }
}

/// Clamp a requested result count to 1..=5, defaulting to 3
fn clamp_max_results(value: Option<&Value>) -> i64 {
    value
        .and_then(Value::as_f64)
        .map(|n| n as i64)
        .unwrap_or(DEFAULT_MAX_RESULTS)
        .clamp(1, MAX_RESULTS_LIMIT)
}

#[async_trait]
impl ToolExecutor for PolicySearchTool {
    fn name(&self) -> &str {
        SEARCH_TERMS_CONDITIONS
    }

    fn description(&self) -> &str {
        "Search terms and conditions, return, warranty, delivery and privacy policies. \
         Use when the customer asks about store policies."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new()
            .field(FieldSpec::required(
                "query",
                FieldKind::String,
                "Policy question, e.g. 'return policy for phones'",
            ))
            .field(FieldSpec::optional(
                "max_results",
                FieldKind::Integer,
                "Number of policy sections to return (1-5, default 3)",
            ))
    }

    async fn execute(&self, args: Map<String, Value>) -> Result<Value> {
        let query = args
            .get("query")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default();

        if query.is_empty() {
            return Err(AssistantError::Tool("Query cannot be empty".to_string()).into());
        }

        let body = json!({
            "query": query,
            "max_results": clamp_max_results(args.get("max_results")),
        });

        tracing::debug!(url = %self.endpoint.url(), "Searching policies");
        self.endpoint.post(&body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ToolCall;
    use crate::tools::ToolRegistry;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn registry_for(server: &MockServer) -> ToolRegistry {
        let endpoint = JsonEndpoint::new(server.uri(), Duration::from_secs(5)).unwrap();
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(PolicySearchTool::new(endpoint)));
        registry
    }

    #[test]
    fn test_clamp_max_results() {
        assert_eq!(clamp_max_results(None), 3);
        assert_eq!(clamp_max_results(Some(&json!(0))), 1);
        assert_eq!(clamp_max_results(Some(&json!(2))), 2);
        assert_eq!(clamp_max_results(Some(&json!(50))), 5);
        assert_eq!(clamp_max_results(Some(&json!(-4))), 1);
    }

    #[tokio::test]
    async fn test_search_clamps_and_trims() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({"query": "return policy", "max_results": 5})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"section": "Returns", "content": "7 day replacement"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let registry = registry_for(&server);
        let call = ToolCall::new(
            "c1",
            SEARCH_TERMS_CONDITIONS,
            json!({"query": " return policy ", "max_results": 9}),
        );
        let result = registry.dispatch(&call).await;

        assert!(!result.is_error);
        assert_eq!(result.content["results"][0]["section"], "Returns");
    }

    #[tokio::test]
    async fn test_blank_query_returns_error_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let registry = registry_for(&server);
        let result = registry
            .dispatch(&ToolCall::new("c1", SEARCH_TERMS_CONDITIONS, json!({"query": "   "})))
            .await;

        assert!(result.is_error);
        assert_eq!(result.content["tool"], SEARCH_TERMS_CONDITIONS);
    }
}
