//! Store locator tool

use crate::error::{AssistantError, Result};
use crate::tools::{FieldKind, FieldSpec, JsonEndpoint, ToolExecutor, ToolSchema};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Tool name advertised to the model
pub const GET_NEAR_STORE: &str = "get_near_store";

/// Finds stores by city or zipcode
pub struct StoreLocatorTool {
    endpoint: JsonEndpoint,
}

impl StoreLocatorTool {
    /// Create the tool on top of a store locator endpoint
    pub fn new(endpoint: JsonEndpoint) -> Self {
        Self { endpoint }
    }
}

/// Trimmed text of an argument; whole numbers are written out as digits
fn non_blank(args: &Map<String, Value>, key: &str) -> Option<String> {
    let text = match args.get(key)? {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => match (number.as_i64(), number.as_u64(), number.as_f64()) {
            (Some(whole), _, _) => whole.to_string(),
            (None, Some(whole), _) => whole.to_string(),
            (None, None, Some(float)) if float.fract() == 0.0 => format!("{:.0}", float),
            _ => return None,
        },
        _ => return None,
    };
    Some(text).filter(|text| !text.is_empty())
}

#[async_trait]
impl ToolExecutor for StoreLocatorTool {
    fn name(&self) -> &str {
        GET_NEAR_STORE
    }

    fn description(&self) -> &str {
        "Find nearby stores by city name or zipcode. Use only when the customer asks \
         about store locations."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new()
            .field(FieldSpec::optional(
                "city",
                FieldKind::String,
                "City name, e.g. 'Indore'",
            ))
            .field(FieldSpec::optional(
                "zipcode",
                FieldKind::Code,
                "Postal code, e.g. '452001'",
            ))
    }

    async fn execute(&self, args: Map<String, Value>) -> Result<Value> {
        let city = non_blank(&args, "city");
        let zipcode = non_blank(&args, "zipcode");

        if city.is_none() && zipcode.is_none() {
            return Err(
                AssistantError::Tool("Provide a city or a zipcode".to_string()).into(),
            );
        }

        let mut body = Map::new();
        if let Some(city) = city {
            body.insert("city".to_string(), Value::String(city));
        }
        if let Some(zipcode) = zipcode {
            body.insert("zipcode".to_string(), Value::String(zipcode));
        }

        tracing::debug!(url = %self.endpoint.url(), "Looking up stores");
        self.endpoint.post(&Value::Object(body)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ToolCall;
    use crate::tools::ToolRegistry;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn registry_for(url: String) -> ToolRegistry {
        let endpoint = JsonEndpoint::new(url, Duration::from_secs(5)).unwrap();
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(StoreLocatorTool::new(endpoint)));
        registry
    }

    #[tokio::test]
    async fn test_lookup_by_city_trims_input() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/stores/nearby"))
            .and(body_json(json!({"city": "Indore"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "stores": [{"store_name": "Vijay Nagar", "city": "Indore"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let registry = registry_for(format!("{}/stores/nearby", server.uri()));
        let result = registry
            .dispatch(&ToolCall::new("c1", GET_NEAR_STORE, json!({"city": "  Indore "})))
            .await;

        assert!(!result.is_error);
        assert_eq!(result.content["stores"][0]["city"], "Indore");
    }

    #[tokio::test]
    async fn test_lookup_requires_city_or_zipcode() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let registry = registry_for(server.uri());
        let result = registry
            .dispatch(&ToolCall::new("c1", GET_NEAR_STORE, json!({"city": " "})))
            .await;

        assert!(result.is_error);
        assert!(result.content["error"]
            .as_str()
            .unwrap()
            .contains("city or a zipcode"));
    }

    #[tokio::test]
    async fn test_numeric_zipcode_is_sent_as_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/stores/nearby"))
            .and(body_json(json!({"zipcode": "452001"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "stores": [{"store_name": "Vijay Nagar", "zipcode": "452001"}]
            })))
            .expect(2)
            .mount(&server)
            .await;

        let registry = registry_for(format!("{}/stores/nearby", server.uri()));
        for zipcode in [json!(452001), json!(452001.0)] {
            let result = registry
                .dispatch(&ToolCall::new("c1", GET_NEAR_STORE, json!({"zipcode": zipcode})))
                .await;
            assert!(!result.is_error, "{}", result.content);
            assert_eq!(result.content["stores"][0]["zipcode"], "452001");
        }
    }

    #[test]
    fn test_non_blank_reads_text_and_whole_numbers() {
        let args = json!({"a": " 452001 ", "b": 452001, "c": "   ", "d": true});
        let args = args.as_object().unwrap();
        assert_eq!(non_blank(args, "a").as_deref(), Some("452001"));
        assert_eq!(non_blank(args, "b").as_deref(), Some("452001"));
        assert_eq!(non_blank(args, "c"), None);
        assert_eq!(non_blank(args, "d"), None);
        assert_eq!(non_blank(args, "missing"), None);
    }
}
