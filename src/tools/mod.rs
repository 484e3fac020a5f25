//! Tools module for the retail assistant
//!
//! This module contains tool declarations, argument schemas, the tool
//! registry and the shipped retail tools (product search, store locator and
//! policy search).

pub mod endpoint;
pub mod policy_search;
pub mod product_search;
pub mod registry_builder;
pub mod store_locator;

pub use endpoint::JsonEndpoint;
pub use policy_search::PolicySearchTool;
pub use product_search::ProductSearchTool;
pub use registry_builder::ToolRegistryBuilder;
pub use store_locator::StoreLocatorTool;

use crate::error::{AssistantError, Result};
use crate::providers::{Message, ToolCall};
use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

/// Tool definition structure
///
/// Represents a tool as advertised to the model provider. Follows the
/// OpenAI function calling format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Name of the tool
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// JSON schema for the tool's parameters
    pub parameters: Value,
}

/// JSON type of a declared tool argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// JSON string
    String,
    /// Identifier such as a postal code, sent as a string or a whole number
    Code,
    /// Whole number
    Integer,
    /// Any JSON number
    Number,
    /// `true` or `false`
    Boolean,
    /// JSON array
    Array,
    /// JSON object
    Object,
}

impl FieldKind {
    /// JSON schema type name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String | Self::Code => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// Whether `value` has this kind
    ///
    /// Floats with no fractional part count as integers; some models emit
    /// `5.0` for integer arguments.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Code => value.is_string() || Self::Integer.matches(value),
            Self::Integer => {
                value.is_i64()
                    || value.is_u64()
                    || value.as_f64().map(|f| f.fract() == 0.0).unwrap_or(false)
            }
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

/// One declared tool argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Argument name
    pub name: String,
    /// Expected JSON type
    pub kind: FieldKind,
    /// Whether the argument must be present and non-null
    pub required: bool,
    /// Description shown to the model
    pub description: String,
}

impl FieldSpec {
    /// Declare a required argument
    pub fn required(name: impl Into<String>, kind: FieldKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            description: description.into(),
        }
    }

    /// Declare an optional argument
    pub fn optional(name: impl Into<String>, kind: FieldKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: description.into(),
        }
    }
}

/// Ordered argument schema of a tool
///
/// # Examples
///
/// ```
/// use retail_assistant::tools::{FieldKind, FieldSpec, ToolSchema};
/// use serde_json::json;
///
/// let schema = ToolSchema::new()
///     .field(FieldSpec::required("query", FieldKind::String, "What to search for"))
///     .field(FieldSpec::optional("max_results", FieldKind::Integer, "Result limit"));
///
/// let args = schema.validate(&json!({"query": "tv", "color": "red"})).unwrap();
/// assert_eq!(args.len(), 1);
/// assert!(schema.validate(&json!({"max_results": 2})).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolSchema {
    fields: Vec<FieldSpec>,
}

impl ToolSchema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field declaration
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Declared fields in declaration order
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Validate model-supplied arguments
    ///
    /// Arguments must be a JSON object. Required fields must be present and
    /// non-null, declared fields must have the declared kind, and undeclared
    /// fields are dropped. A null optional field is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns `AssistantError::Tool` describing the first violation
    pub fn validate(&self, args: &Value) -> Result<Map<String, Value>> {
        let object = args.as_object().ok_or_else(|| {
            AssistantError::Tool("Tool arguments must be a JSON object".to_string())
        })?;

        let mut validated = Map::new();
        for spec in &self.fields {
            match object.get(&spec.name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        return Err(AssistantError::Tool(format!(
                            "Missing required argument: {}",
                            spec.name
                        ))
                        .into());
                    }
                }
                Some(value) => {
                    if !spec.kind.matches(value) {
                        return Err(AssistantError::Tool(format!(
                            "Argument '{}' must be of type {}",
                            spec.name,
                            spec.kind.as_str()
                        ))
                        .into());
                    }
                    validated.insert(spec.name.clone(), value.clone());
                }
            }
        }

        Ok(validated)
    }

    /// JSON schema form advertised in the provider's tool catalog
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|spec| {
                (
                    spec.name.clone(),
                    json!({
                        "type": spec.kind.as_str(),
                        "description": spec.description,
                    }),
                )
            })
            .collect();

        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|spec| spec.required)
            .map(|spec| spec.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Tool result structure
///
/// Exactly one result is produced per [`ToolCall`]. Failures are carried as
/// data: the content becomes `{"error": ..., "tool": ...}` and `is_error` is
/// set.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    /// Id of the call this result answers
    pub tool_call_id: String,
    /// Name of the tool that was called
    pub tool_name: String,
    /// JSON content handed back to the model
    pub content: Value,
    /// Whether the call failed
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(call: &ToolCall, content: Value) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            tool_name: call.name.clone(),
            content,
            is_error: false,
        }
    }

    /// Create a failed tool result
    ///
    /// # Examples
    ///
    /// ```
    /// use retail_assistant::providers::ToolCall;
    /// use retail_assistant::tools::ToolResult;
    ///
    /// let call = ToolCall::new("call_1", "get_near_store", serde_json::json!({}));
    /// let result = ToolResult::error(&call, "Provide a city or a zipcode");
    /// assert!(result.is_error);
    /// assert_eq!(result.content["tool"], "get_near_store");
    /// ```
    pub fn error(call: &ToolCall, message: impl Into<String>) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            tool_name: call.name.clone(),
            content: json!({
                "error": message.into(),
                "tool": call.name,
            }),
            is_error: true,
        }
    }

    /// Convert to a tool message for the run transcript
    pub fn to_message(&self) -> Message {
        let content = match &self.content {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        Message::tool(&self.tool_call_id, &self.tool_name, content)
    }
}

/// Tool executor trait for implementing tool execution logic
///
/// Each tool declares its name, description and argument schema, and
/// executes with arguments already validated against that schema.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use retail_assistant::error::Result;
/// use retail_assistant::tools::{FieldKind, FieldSpec, ToolExecutor, ToolSchema};
/// use serde_json::{json, Map, Value};
///
/// struct EchoTool;
///
/// #[async_trait]
/// impl ToolExecutor for EchoTool {
///     fn name(&self) -> &str {
///         "echo"
///     }
///
///     fn description(&self) -> &str {
///         "Echo the query back"
///     }
///
///     fn schema(&self) -> ToolSchema {
///         ToolSchema::new().field(FieldSpec::required("query", FieldKind::String, "Text"))
///     }
///
///     async fn execute(&self, args: Map<String, Value>) -> Result<Value> {
///         Ok(json!({ "echo": args["query"] }))
///     }
/// }
///
/// assert_eq!(EchoTool.definition().name, "echo");
/// ```
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Unique tool name
    fn name(&self) -> &str;

    /// Description shown to the model
    fn description(&self) -> &str;

    /// Argument schema
    fn schema(&self) -> ToolSchema;

    /// Executes the tool with validated arguments
    ///
    /// # Errors
    ///
    /// Returns error if the backend call fails; the registry turns it into an
    /// error result
    async fn execute(&self, args: Map<String, Value>) -> Result<Value>;

    /// Catalog entry for the provider
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.schema().to_json_schema(),
        }
    }
}

/// Tool registry for managing available tools
///
/// Tools keep their registration order, which is also the order of the
/// catalog sent to the model.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn ToolExecutor>>,
    timeout: Duration,
}

impl ToolRegistry {
    /// Create a new empty tool registry with a 30 second dispatch timeout
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the upper bound for a single dispatch
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Register a tool executor
    ///
    /// Registering a name twice replaces the earlier executor in place.
    pub fn register(&mut self, executor: Arc<dyn ToolExecutor>) {
        match self
            .tools
            .iter()
            .position(|existing| existing.name() == executor.name())
        {
            Some(index) => self.tools[index] = executor,
            None => self.tools.push(executor),
        }
    }

    /// Get a tool executor by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolExecutor>> {
        self.tools.iter().find(|tool| tool.name() == name).cloned()
    }

    /// Tool catalog in registration order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|tool| tool.definition()).collect()
    }

    /// Registered tool names in registration order
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|tool| tool.name().to_string()).collect()
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Dispatch one tool call
    ///
    /// Never fails: an unknown tool, invalid arguments, an executor error, a
    /// panicking executor or a timeout all produce an error [`ToolResult`].
    /// Calls are not retried.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        let Some(tool) = self.get(&call.name) else {
            tracing::warn!(tool = %call.name, "Model requested unknown tool");
            return ToolResult::error(call, format!("Unknown tool: {}", call.name));
        };

        let args = match tool.schema().validate(&Value::Object(call.args.clone())) {
            Ok(args) => args,
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "Rejected tool arguments");
                return ToolResult::error(call, e.to_string());
            }
        };

        tracing::debug!(tool = %call.name, call_id = %call.id, "Dispatching tool call");

        let execution = AssertUnwindSafe(tool.execute(args)).catch_unwind();
        match tokio::time::timeout(self.timeout, execution).await {
            Ok(Ok(Ok(content))) => ToolResult::success(call, content),
            Ok(Ok(Err(e))) => {
                tracing::warn!(tool = %call.name, error = %e, "Tool execution failed");
                ToolResult::error(call, e.to_string())
            }
            Ok(Err(_)) => {
                tracing::error!(tool = %call.name, "Tool execution panicked");
                ToolResult::error(call, format!("Tool '{}' failed unexpectedly", call.name))
            }
            Err(_) => {
                tracing::warn!(tool = %call.name, "Tool execution timed out");
                ToolResult::error(
                    call,
                    format!(
                        "Tool '{}' timed out after {:?}",
                        call.name, self.timeout
                    ),
                )
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
