//! Retail Assistant - conversational retail assistant library
//!
//! This library answers customer messages by orchestrating a language model
//! with product search, store locator and policy search tools, remembering
//! each session's conversation and always returning a structured result.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `agent`: Session facade, orchestration loop, response normalization
//! - `memory`: Session memory backends and per-session locks
//! - `providers`: Language model abstraction and the Ollama implementation
//! - `tools`: Tool registry and the HTTP-backed retail tools
//! - `prompts`: System prompt generation
//! - `server`: HTTP API
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use retail_assistant::{Assistant, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let assistant = Assistant::from_config(&config)?;
//!     let result = assistant.chat("Do you have 55 inch TVs?", "session-1").await?;
//!     println!("{}", serde_json::to_string_pretty(&result)?);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod memory;
pub mod prompts;
pub mod providers;
pub mod server;
pub mod tools;

// Re-export commonly used types
pub use agent::{Assistant, StructuredResult};
pub use config::Config;
pub use error::{AssistantError, Result};
pub use memory::SessionMemory;

#[cfg(test)]
pub mod test_utils;
