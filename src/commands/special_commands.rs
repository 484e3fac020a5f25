//! Special commands parser for interactive chat mode
//!
//! This module parses the commands that can be entered during an
//! interactive chat session instead of a customer message:
//! - `clear` to forget the session history
//! - `stats` to show session statistics
//! - `help` to list the commands
//! - `quit`, `exit` or `bye` to leave
//!
//! Commands are case-insensitive and may be prefixed with `/`.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType 'help' to see available commands")]
    UnknownCommand(String),
}

/// Special commands that can be executed during interactive chat
///
/// These commands act on the session rather than being sent to the
/// assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Forget the stored history of the current session
    Clear,

    /// Display stored message count and active sessions
    Stats,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent to the assistant.
    None,
}

/// Parse a user input string into a special command
///
/// Bare words are only treated as commands when they match exactly, so a
/// message such as "clear phone cases" still reaches the assistant. Input
/// starting with `/` must be a known command.
///
/// # Errors
///
/// Returns `CommandError::UnknownCommand` if input starts with "/" but is
/// not a valid command.
///
/// # Examples
///
/// ```
/// use retail_assistant::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("BYE").unwrap(), SpecialCommand::Exit);
/// assert_eq!(parse_special_command("/stats").unwrap(), SpecialCommand::Stats);
/// assert_eq!(
///     parse_special_command("show me phones").unwrap(),
///     SpecialCommand::None
/// );
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();
    let word = lower.strip_prefix('/').unwrap_or(&lower);

    match word {
        "clear" => Ok(SpecialCommand::Clear),
        "stats" => Ok(SpecialCommand::Stats),
        "help" => Ok(SpecialCommand::Help),
        "quit" | "exit" | "bye" => Ok(SpecialCommand::Exit),
        _ if trimmed.starts_with('/') => Err(CommandError::UnknownCommand(trimmed.to_string())),
        _ => Ok(SpecialCommand::None),
    }
}

/// Print help for interactive chat commands
pub fn print_help() {
    println!(
        r#"
Chat Commands
=============

  clear           - Clear this session's conversation history
  stats           - Show stored messages and active sessions
  help            - Show this help
  quit/exit/bye   - End the conversation

Anything else is sent to the assistant.
"#
    );
}
