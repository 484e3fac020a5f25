//! Provider module for the retail assistant
//!
//! This module contains the language model provider abstraction and the
//! Ollama implementation.

pub mod base;
pub mod ollama;

pub use base::{
    validate_message_sequence, CompletionResponse, Message, Provider, Role, TokenUsage, ToolCall,
};
pub use ollama::OllamaProvider;

use crate::config::ProviderConfig;
use crate::error::{AssistantError, Result};
use std::time::Duration;

/// Create a provider instance based on configuration
///
/// # Arguments
///
/// * `config` - Provider configuration
///
/// # Returns
///
/// Returns a boxed provider instance
///
/// # Errors
///
/// Returns error if provider type is invalid or initialization fails
///
/// # Examples
///
/// ```
/// use retail_assistant::config::ProviderConfig;
/// use retail_assistant::providers::create_provider;
///
/// let provider = create_provider(&ProviderConfig::default()).unwrap();
/// assert_eq!(provider.get_current_model().unwrap(), "llama3.2:latest");
/// ```
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn Provider>> {
    match config.provider_type.as_str() {
        "ollama" => Ok(Box::new(OllamaProvider::with_timeout(
            config.ollama.clone(),
            Duration::from_secs(config.timeout_seconds),
        )?)),
        other => Err(AssistantError::Provider(format!("Unknown provider type: {}", other)).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OllamaConfig;

    #[test]
    fn test_create_provider_invalid_type() {
        let config = ProviderConfig {
            provider_type: "invalid".to_string(),
            ..ProviderConfig::default()
        };

        let result = create_provider(&config);
        assert!(result.is_err());
    }

    #[test]
    fn test_create_provider_ollama_model() {
        let config = ProviderConfig {
            ollama: OllamaConfig {
                host: "http://localhost:11434".to_string(),
                model: "gemma2:2b".to_string(),
            },
            ..ProviderConfig::default()
        };

        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.get_current_model().unwrap(), "gemma2:2b");
    }
}
