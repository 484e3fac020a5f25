//! Error types for the retail assistant
//!
//! This module defines all error types used throughout the crate,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for assistant operations
///
/// Most of these never reach a `chat()` caller: provider, tool and storage
/// failures are recovered inside the orchestration run. They surface from
/// configuration loading, adapter construction and input validation.
#[derive(Error, Debug)]
pub enum AssistantError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider-related errors (API calls, timeouts, malformed responses)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Tool execution errors
    #[error("Tool execution error: {0}")]
    Tool(String),

    /// Session memory backend errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Caller supplied an empty message or session id
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for assistant operations
///
/// Uses `anyhow::Error` so callers can attach context while still being able
/// to downcast to [`AssistantError`].
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = AssistantError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_provider_error_display() {
        let error = AssistantError::Provider("API timeout".to_string());
        assert_eq!(error.to_string(), "Provider error: API timeout");
    }

    #[test]
    fn test_tool_error_display() {
        let error = AssistantError::Tool("store backend down".to_string());
        assert_eq!(error.to_string(), "Tool execution error: store backend down");
    }

    #[test]
    fn test_storage_error_display() {
        let error = AssistantError::Storage("database connection failed".to_string());
        assert_eq!(
            error.to_string(),
            "Storage error: database connection failed"
        );
    }

    #[test]
    fn test_invalid_input_display() {
        let error = AssistantError::InvalidInput("message cannot be empty".to_string());
        assert_eq!(error.to_string(), "Invalid input: message cannot be empty");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: AssistantError = io_error.into();
        assert!(matches!(error, AssistantError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let error: AssistantError = json_error.into();
        assert!(matches!(error, AssistantError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: : yaml").unwrap_err();
        let error: AssistantError = yaml_error.into();
        assert!(matches!(error, AssistantError::Yaml(_)));
    }

    #[test]
    fn test_downcast_from_anyhow() {
        let err: anyhow::Error = AssistantError::InvalidInput("blank".to_string()).into();
        assert!(matches!(
            err.downcast_ref::<AssistantError>(),
            Some(AssistantError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AssistantError>();
    }
}
