//! Command-line interface definition
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, one-shot questions, the HTTP
//! server, and session administration.

use crate::config::MemoryBackend;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Retail Assistant - conversational product, store and policy assistant
///
/// Answers customer questions by combining a language model with product
/// search, store locator and policy search tools.
#[derive(Parser, Debug, Clone)]
#[command(name = "retail-assistant")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "RETAIL_ASSISTANT_CONFIG", default_value = "config/config.yaml")]
    pub config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Override the session memory backend (memory, sled, none)
    #[arg(long, value_parser = parse_memory_backend)]
    pub memory: Option<MemoryBackend>,

    /// Override the sled database directory
    #[arg(long)]
    pub memory_path: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Session id to resume (a new one is generated when omitted)
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Ask a single question and print the structured result as JSON
    Ask {
        /// Session id the question belongs to
        #[arg(short, long, default_value = "cli")]
        session: String,

        /// The customer message
        message: String,
    },

    /// Run the HTTP API server
    Serve {
        /// Bind address override (e.g. 127.0.0.1:8001)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Session administration
    Sessions {
        /// Session subcommand
        #[command(subcommand)]
        command: SessionCommand,
    },
}

/// Session administration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// Clear the stored history of one session
    Clear {
        /// Session id
        id: String,
    },

    /// Show the number of active sessions
    Stats,
}

fn parse_memory_backend(value: &str) -> std::result::Result<MemoryBackend, String> {
    MemoryBackend::parse_str(value).map_err(|e| e.to_string())
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask() {
        let cli = Cli::parse_from(["retail-assistant", "ask", "--session", "s1", "show me phones"]);
        match cli.command {
            Commands::Ask { session, message } => {
                assert_eq!(session, "s1");
                assert_eq!(message, "show me phones");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_memory_override() {
        let cli = Cli::parse_from(["retail-assistant", "--memory", "sled", "sessions", "stats"]);
        assert_eq!(cli.memory, Some(MemoryBackend::Sled));
        assert!(matches!(
            cli.command,
            Commands::Sessions {
                command: SessionCommand::Stats
            }
        ));
    }

    #[test]
    fn test_parse_invalid_memory_backend() {
        let result = Cli::try_parse_from(["retail-assistant", "--memory", "redis", "chat"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_default_config_path() {
        let cli = Cli::parse_from(["retail-assistant", "serve"]);
        assert_eq!(cli.config, "config/config.yaml");
    }
}
