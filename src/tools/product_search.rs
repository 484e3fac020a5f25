//! Product catalog search tool

use crate::error::Result;
use crate::tools::{FieldKind, FieldSpec, JsonEndpoint, ToolExecutor, ToolSchema};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Tool name advertised to the model
pub const SEARCH_PRODUCTS: &str = "search_products";

/// Searches the product catalog for items the customer has not seen yet
pub struct ProductSearchTool {
    endpoint: JsonEndpoint,
}

impl ProductSearchTool {
    /// Create the tool on top of a catalog search endpoint
    pub fn new(endpoint: JsonEndpoint) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl ToolExecutor for ProductSearchTool {
    fn name(&self) -> &str {
        SEARCH_PRODUCTS
    }

    fn description(&self) -> &str {
        "Search the electronics catalog. Use only when the customer asks for products \
         that have not been shown yet in this conversation."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new()
            .field(FieldSpec::required(
                "query",
                FieldKind::String,
                "Natural language product query, e.g. 'Samsung phones under 30000'",
            ))
            .field(FieldSpec::optional(
                "max_results",
                FieldKind::Integer,
                "Maximum number of products to return",
            ))
    }

    async fn execute(&self, args: Map<String, Value>) -> Result<Value> {
        tracing::debug!(url = %self.endpoint.url(), "Searching products");
        self.endpoint.post(&Value::Object(args)).await
    }
}
