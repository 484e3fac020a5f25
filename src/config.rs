//! Configuration management for the retail assistant
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{AssistantError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
///
/// Holds everything needed to assemble an [`crate::agent::Assistant`]:
/// provider settings, orchestration limits, session memory and tool endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Language model provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Orchestration behavior
    #[serde(default)]
    pub assistant: AssistantConfig,
    /// Session memory configuration
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Tool endpoints and limits
    #[serde(default)]
    pub tools: ToolsConfig,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Provider configuration
///
/// Specifies which model provider to use and its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use
    #[serde(rename = "type", default = "default_provider_type")]
    pub provider_type: String,

    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Upper bound for a single model call (seconds)
    #[serde(default = "default_provider_timeout")]
    pub timeout_seconds: u64,
}

fn default_provider_type() -> String {
    "ollama".to_string()
}

fn default_provider_timeout() -> u64 {
    60
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            ollama: OllamaConfig::default(),
            timeout_seconds: default_provider_timeout(),
        }
    }
}

/// Ollama provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama server host
    #[serde(default = "default_ollama_host")]
    pub host: String,

    /// Model to use for Ollama
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:latest".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_ollama_host(),
            model: default_ollama_model(),
        }
    }
}

/// Orchestration behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Maximum number of state transitions in one run
    #[serde(default = "default_max_transitions")]
    pub max_transitions: usize,

    /// Number of persisted messages replayed into a new run
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Follow-up question used when the model output has to be wrapped
    #[serde(default = "default_follow_up")]
    pub default_follow_up: String,
}

fn default_max_transitions() -> usize {
    15
}

fn default_history_window() -> usize {
    6
}

fn default_follow_up() -> String {
    crate::agent::normalizer::DEFAULT_FOLLOW_UP.to_string()
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            max_transitions: default_max_transitions(),
            history_window: default_history_window(),
            default_follow_up: default_follow_up(),
        }
    }
}

/// Session memory backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryBackend {
    /// Process-local map, lost on restart
    #[default]
    Memory,
    /// Embedded sled database on disk
    Sled,
    /// No persistence at all
    None,
}

impl MemoryBackend {
    /// Parse a backend name as used by env vars and the CLI
    ///
    /// # Errors
    ///
    /// Returns `AssistantError::Config` for unknown names
    pub fn parse_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "memory" | "in_memory" => Ok(Self::Memory),
            "sled" => Ok(Self::Sled),
            "none" | "disabled" => Ok(Self::None),
            other => Err(AssistantError::Config(format!(
                "Invalid memory backend: {}. Must be one of: memory, sled, none",
                other
            ))
            .into()),
        }
    }
}

/// Session memory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Which backend to use
    #[serde(default)]
    pub backend: MemoryBackend,

    /// Database directory for the sled backend (defaults to the user data dir)
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Session expiry, refreshed on every write (seconds)
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,

    /// Maximum number of persisted messages per session
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

fn default_ttl() -> u64 {
    1800
}

fn default_max_messages() -> usize {
    30
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: MemoryBackend::default(),
            path: None,
            ttl_seconds: default_ttl(),
            max_messages: default_max_messages(),
        }
    }
}

/// Tool configuration
///
/// A tool whose endpoint is `None` is not registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Upper bound for a single tool dispatch (seconds)
    #[serde(default = "default_tool_timeout")]
    pub timeout_seconds: u64,

    /// Product search backend endpoint
    #[serde(default = "default_product_search_url")]
    pub product_search_url: Option<String>,

    /// Store locator backend endpoint
    #[serde(default = "default_store_locator_url")]
    pub store_locator_url: Option<String>,

    /// Terms, conditions and privacy policy search endpoint
    #[serde(default = "default_policy_search_url")]
    pub policy_search_url: Option<String>,
}

fn default_tool_timeout() -> u64 {
    30
}

fn default_product_search_url() -> Option<String> {
    Some("http://localhost:8080/products/search".to_string())
}

fn default_store_locator_url() -> Option<String> {
    Some("http://localhost:8080/stores/nearby".to_string())
}

fn default_policy_search_url() -> Option<String> {
    Some("http://localhost:8080/policies/search".to_string())
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_tool_timeout(),
            product_search_url: default_product_search_url(),
            store_locator_url: default_store_locator_url(),
            policy_search_url: default_policy_search_url(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the `serve` command binds to
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:8001".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AssistantError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| AssistantError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(provider_type) = std::env::var("RETAIL_ASSISTANT_PROVIDER") {
            self.provider.provider_type = provider_type;
        }

        if let Ok(host) = std::env::var("RETAIL_ASSISTANT_OLLAMA_HOST") {
            self.provider.ollama.host = host;
        }

        if let Ok(model) = std::env::var("RETAIL_ASSISTANT_OLLAMA_MODEL") {
            self.provider.ollama.model = model;
        }

        if let Ok(timeout) = std::env::var("RETAIL_ASSISTANT_PROVIDER_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.provider.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid RETAIL_ASSISTANT_PROVIDER_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(max_transitions) = std::env::var("RETAIL_ASSISTANT_MAX_TRANSITIONS") {
            if let Ok(value) = max_transitions.parse() {
                self.assistant.max_transitions = value;
            } else {
                tracing::warn!("Invalid RETAIL_ASSISTANT_MAX_TRANSITIONS: {}", max_transitions);
            }
        }

        if let Ok(backend) = std::env::var("RETAIL_ASSISTANT_MEMORY_BACKEND") {
            match MemoryBackend::parse_str(&backend) {
                Ok(value) => self.memory.backend = value,
                Err(e) => tracing::warn!("{}", e),
            }
        }

        if let Ok(path) = std::env::var("RETAIL_ASSISTANT_MEMORY_PATH") {
            self.memory.path = Some(PathBuf::from(path));
        }

        if let Ok(ttl) = std::env::var("RETAIL_ASSISTANT_MEMORY_TTL_SECONDS") {
            if let Ok(value) = ttl.parse() {
                self.memory.ttl_seconds = value;
            } else {
                tracing::warn!("Invalid RETAIL_ASSISTANT_MEMORY_TTL_SECONDS: {}", ttl);
            }
        }

        if let Ok(url) = std::env::var("RETAIL_ASSISTANT_PRODUCT_SEARCH_URL") {
            self.tools.product_search_url = Some(url);
        }

        if let Ok(url) = std::env::var("RETAIL_ASSISTANT_STORE_LOCATOR_URL") {
            self.tools.store_locator_url = Some(url);
        }

        if let Ok(url) = std::env::var("RETAIL_ASSISTANT_POLICY_SEARCH_URL") {
            self.tools.policy_search_url = Some(url);
        }

        if let Ok(bind) = std::env::var("RETAIL_ASSISTANT_BIND") {
            self.server.bind = bind;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(backend) = cli.memory {
            tracing::debug!(?backend, "CLI override: memory backend");
            self.memory.backend = backend;
        }

        if let Some(path) = &cli.memory_path {
            self.memory.path = Some(path.clone());
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `AssistantError::Config` describing the first invalid setting
    pub fn validate(&self) -> Result<()> {
        if self.provider.provider_type.is_empty() {
            return Err(AssistantError::Config("Provider type cannot be empty".to_string()).into());
        }

        let valid_providers = ["ollama"];
        if !valid_providers.contains(&self.provider.provider_type.as_str()) {
            return Err(AssistantError::Config(format!(
                "Invalid provider type: {}. Must be one of: {}",
                self.provider.provider_type,
                valid_providers.join(", ")
            ))
            .into());
        }

        if self.provider.timeout_seconds == 0 {
            return Err(AssistantError::Config(
                "provider.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.assistant.max_transitions == 0 {
            return Err(AssistantError::Config(
                "assistant.max_transitions must be greater than 0".to_string(),
            )
            .into());
        }

        if self.assistant.max_transitions > 100 {
            return Err(AssistantError::Config(
                "assistant.max_transitions must be less than or equal to 100".to_string(),
            )
            .into());
        }

        if self.memory.max_messages == 0 {
            return Err(AssistantError::Config(
                "memory.max_messages must be greater than 0".to_string(),
            )
            .into());
        }

        if self.assistant.history_window > self.memory.max_messages {
            return Err(AssistantError::Config(format!(
                "assistant.history_window ({}) cannot exceed memory.max_messages ({})",
                self.assistant.history_window, self.memory.max_messages
            ))
            .into());
        }

        if self.memory.ttl_seconds == 0 {
            return Err(AssistantError::Config(
                "memory.ttl_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.tools.timeout_seconds == 0 {
            return Err(AssistantError::Config(
                "tools.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider.provider_type, "ollama");
        assert_eq!(config.assistant.max_transitions, 15);
        assert_eq!(config.assistant.history_window, 6);
        assert_eq!(config.memory.ttl_seconds, 1800);
        assert_eq!(config.memory.max_messages, 30);
        assert_eq!(config.memory.backend, MemoryBackend::Memory);
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_provider() {
        let mut config = Config::default();
        config.provider.provider_type = "invalid".to_string();
        assert!(config.validate().is_err());

        config.provider.provider_type = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_max_transitions() {
        let mut config = Config::default();
        config.assistant.max_transitions = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_history_window_exceeds_cap() {
        let mut config = Config::default();
        config.assistant.history_window = 31;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_ttl() {
        let mut config = Config::default();
        config.memory.ttl_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
provider:
  type: ollama
  timeout_seconds: 20
  ollama:
    host: http://ollama.internal:11434
    model: qwen2.5:7b

assistant:
  max_transitions: 9
  history_window: 4

memory:
  backend: sled
  path: /var/lib/retail-assistant/sessions
  ttl_seconds: 600

tools:
  timeout_seconds: 5
  store_locator_url: ~
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.provider.timeout_seconds, 20);
        assert_eq!(config.provider.ollama.model, "qwen2.5:7b");
        assert_eq!(config.assistant.max_transitions, 9);
        assert_eq!(config.assistant.history_window, 4);
        assert_eq!(config.memory.backend, MemoryBackend::Sled);
        assert_eq!(config.memory.ttl_seconds, 600);
        assert_eq!(config.memory.max_messages, 30);
        assert!(config.tools.store_locator_url.is_none());
        assert!(config.tools.product_search_url.is_some());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_memory_backend_parse() {
        assert_eq!(MemoryBackend::parse_str("SLED").unwrap(), MemoryBackend::Sled);
        assert_eq!(MemoryBackend::parse_str("none").unwrap(), MemoryBackend::None);
        assert_eq!(
            MemoryBackend::parse_str("memory").unwrap(),
            MemoryBackend::Memory
        );
        assert!(MemoryBackend::parse_str("redis").is_err());
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        std::env::set_var("RETAIL_ASSISTANT_MAX_TRANSITIONS", "7");
        std::env::set_var("RETAIL_ASSISTANT_MEMORY_BACKEND", "none");
        std::env::set_var("RETAIL_ASSISTANT_OLLAMA_MODEL", "mistral:latest");

        let cli = Cli::parse_from(["retail-assistant", "sessions", "stats"]);
        let config = Config::load("/nonexistent/config.yaml", &cli).unwrap();

        std::env::remove_var("RETAIL_ASSISTANT_MAX_TRANSITIONS");
        std::env::remove_var("RETAIL_ASSISTANT_MEMORY_BACKEND");
        std::env::remove_var("RETAIL_ASSISTANT_OLLAMA_MODEL");

        assert_eq!(config.assistant.max_transitions, 7);
        assert_eq!(config.memory.backend, MemoryBackend::None);
        assert_eq!(config.provider.ollama.model, "mistral:latest");
    }

    #[test]
    #[serial]
    fn test_invalid_env_value_is_ignored() {
        std::env::set_var("RETAIL_ASSISTANT_MAX_TRANSITIONS", "lots");

        let cli = Cli::parse_from(["retail-assistant", "sessions", "stats"]);
        let config = Config::load("/nonexistent/config.yaml", &cli).unwrap();

        std::env::remove_var("RETAIL_ASSISTANT_MAX_TRANSITIONS");

        assert_eq!(config.assistant.max_transitions, 15);
    }

    #[test]
    #[serial]
    fn test_cli_memory_override_wins_over_env() {
        std::env::set_var("RETAIL_ASSISTANT_MEMORY_BACKEND", "sled");

        let cli = Cli::parse_from(["retail-assistant", "--memory", "none", "sessions", "stats"]);
        let config = Config::load("/nonexistent/config.yaml", &cli).unwrap();

        std::env::remove_var("RETAIL_ASSISTANT_MEMORY_BACKEND");

        assert_eq!(config.memory.backend, MemoryBackend::None);
    }
}
